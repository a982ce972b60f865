//! # Repository Module
//!
//! Database repository implementations for the invoice store.
//!
//! ```text
//! ProfileRepository                      InvoiceRepository
//! ├── create(profile)                    ├── issue(profile_id, draft)
//! ├── get_by_id(id)                      ├── get_by_id(id)
//! ├── update_range(id, authorization)    ├── get_items(invoice_id)
//! ├── next_invoice_number(id)            ├── list_for_profile(profile_id, limit)
//! └── assess(id, today)                  └── void(id)
//! ```
//!
//! Both repositories decode rows through private `FromRow` structs, since
//! decimals and dates are stored as text.

pub mod invoice;
pub mod profile;

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{DbError, DbResult};

/// Decodes a TEXT decimal column.
pub(crate) fn decode_decimal(column: &str, raw: &str) -> DbResult<Decimal> {
    Decimal::from_str(raw).map_err(|_| DbError::corrupt(column, raw))
}

/// Decodes a TEXT `YYYY-MM-DD` column.
pub(crate) fn decode_date(column: &str, raw: &str) -> DbResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| DbError::corrupt(column, raw))
}
