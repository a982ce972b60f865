//! # Issuance Assessment
//!
//! Combines the range check and the CAI check for the number a profile
//! would issue next. The assessment is advisory: the app shows warnings
//! from it, and the storage layer calls [`IssuanceAssessment::ensure_issuable`]
//! when it wants a hard stop.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cai::{check_cai_expiration_on, CaiAdvisory, CaiStatus};
use crate::error::{CoreError, CoreResult};
use crate::types::FiscalProfile;

/// Why a caller would refuse to issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingReason {
    CaiExpired,
    OutOfRange,
}

/// Result of checking a profile's next number on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceAssessment {
    pub invoice_number: String,
    pub in_range: bool,
    pub cai: CaiStatus,
    /// Numbers left including `invoice_number`, when it can be counted.
    pub remaining: Option<u64>,
}

impl IssuanceAssessment {
    /// First reason to block, CAI expiry taking precedence.
    pub fn blocking_reason(&self) -> Option<BlockingReason> {
        self.blocking_reasons().into_iter().next()
    }

    pub fn cai_advisory(&self) -> CaiAdvisory {
        self.cai.advisory()
    }

    /// Every blocking reason that applies, CAI expiry first.
    pub fn blocking_reasons(&self) -> Vec<BlockingReason> {
        let mut reasons = Vec::new();
        if self.cai.is_expired {
            reasons.push(BlockingReason::CaiExpired);
        }
        if !self.in_range {
            reasons.push(BlockingReason::OutOfRange);
        }
        reasons
    }

    /// The error a caller reports when it blocks for `reason`.
    pub fn error_for(&self, reason: BlockingReason, profile: &FiscalProfile) -> CoreError {
        match reason {
            BlockingReason::CaiExpired => CoreError::CaiExpired {
                cai: profile.cai.clone(),
                days_overdue: -self.cai.days_until_expiry,
            },
            BlockingReason::OutOfRange => CoreError::OutOfRange {
                number: self.invoice_number.clone(),
                start: profile.invoice_range_start.clone(),
                end: profile.invoice_range_end.clone(),
            },
        }
    }

    /// Fails with the first blocking reason, if any.
    pub fn ensure_issuable(&self, profile: &FiscalProfile) -> CoreResult<()> {
        match self.blocking_reason() {
            None => Ok(()),
            Some(reason) => Err(self.error_for(reason, profile)),
        }
    }
}

/// Assesses the profile's next invoice number as of `today`.
///
/// ## Example
/// ```rust,ignore
/// let assessment = assess_issuance(&profile, Local::now().date_naive());
/// if assessment.cai_advisory() == CaiAdvisory::ExpiringSoon {
///     // show the renewal reminder
/// }
/// ```
pub fn assess_issuance(profile: &FiscalProfile, today: NaiveDate) -> IssuanceAssessment {
    let range = profile.range();
    let number = profile.next_invoice_number.clone();

    IssuanceAssessment {
        in_range: range.contains(&number),
        cai: check_cai_expiration_on(&profile.cai_expiration_date, today),
        remaining: range
            .remaining_from(&number)
            .map(|n| u64::try_from(n).unwrap_or(u64::MAX)),
        invoice_number: number,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
