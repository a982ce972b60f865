//! # CAI Expiration
//!
//! A CAI (Código de Autorización de Impresión) is valid until a fixed
//! date. The app warns during the last 30 days and the caller may refuse
//! to issue once it has expired.
//!
//! ```text
//!   days_until_expiry:   ... -2  -1 │ 0   1  ...  30 │ 31  32 ...
//!                        expired    │ expiring soon  │ healthy
//! ```
//!
//! Both dates are compared as calendar dates, so "expires today" is
//! exactly 0 days regardless of the time of day. A stored date that
//! cannot be read is reported as far from expiry (999 days) so a typo in
//! the profile never stops invoicing.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use crate::{CAI_UNKNOWN_DAYS, CAI_WARNING_DAYS};

/// Expiry classification of a CAI on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CaiStatus {
    pub is_expired: bool,
    pub days_until_expiry: i64,
    pub is_expiring_soon: bool,
}

impl CaiStatus {
    fn from_days(days_until_expiry: i64) -> Self {
        CaiStatus {
            is_expired: days_until_expiry < 0,
            days_until_expiry,
            is_expiring_soon: (0..=CAI_WARNING_DAYS).contains(&days_until_expiry),
        }
    }

    /// Status used when the expiration date cannot be read.
    pub const fn unknown() -> Self {
        CaiStatus {
            is_expired: false,
            days_until_expiry: CAI_UNKNOWN_DAYS,
            is_expiring_soon: false,
        }
    }

    /// Which dialog, if any, the app should show.
    pub fn advisory(&self) -> CaiAdvisory {
        if self.is_expired {
            CaiAdvisory::Expired
        } else if self.is_expiring_soon {
            CaiAdvisory::ExpiringSoon
        } else {
            CaiAdvisory::Healthy
        }
    }
}

/// Presentation-level summary of a [`CaiStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CaiAdvisory {
    Expired,
    ExpiringSoon,
    Healthy,
}

/// Checks a CAI expiration date against today's local date.
///
/// See [`check_cai_expiration_on`] for the rules.
pub fn check_cai_expiration(expiration_date: &str) -> CaiStatus {
    check_cai_expiration_on(expiration_date, Local::now().date_naive())
}

/// Checks a CAI expiration date against an explicit `today`.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (converted to local date) and
/// naive `YYYY-MM-DDTHH:MM:SS` timestamps. Anything else yields
/// [`CaiStatus::unknown`].
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use factura_core::cai::check_cai_expiration_on;
///
/// let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
///
/// let status = check_cai_expiration_on("2025-06-01", today);
/// assert!(!status.is_expired);
/// assert_eq!(status.days_until_expiry, 0);
/// assert!(status.is_expiring_soon);
///
/// let status = check_cai_expiration_on("2025-05-31", today);
/// assert!(status.is_expired);
/// assert_eq!(status.days_until_expiry, -1);
///
/// let status = check_cai_expiration_on("not-a-date", today);
/// assert_eq!(status.days_until_expiry, 999);
/// ```
pub fn check_cai_expiration_on(expiration_date: &str, today: NaiveDate) -> CaiStatus {
    match parse_expiration_date(expiration_date) {
        Some(expires_on) => CaiStatus::from_days((expires_on - today).num_days()),
        None => {
            warn!(expiration_date = %expiration_date, "Unreadable CAI expiration date; treating CAI as valid");
            CaiStatus::unknown()
        }
    }
}

/// Reads the stored expiration date as a calendar date.
pub fn parse_expiration_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Local).date_naive());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|timestamp| timestamp.date())
}

// =============================================================================
// Unit Tests
// =============================================================================
