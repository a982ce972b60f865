//! # factura-core: Pure Fiscal Engine for Factura HN
//!
//! Everything needed to number, total and vet a Honduran fiscal invoice,
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Factura HN Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Mobile App (presentation)                       │   │
//! │  │   Invoice form ──► Totals preview ──► CAI warning dialogs       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ factura-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  ┌───────────┐ ┌─────────┐ ┌─────────┐ ┌───────┐ ┌───────────┐ │   │
//! │  │  │ numbering │ │  range  │ │ totals  │ │  cai  │ │   money   │ │   │
//! │  │  │ increment │ │ 3-tier  │ │ ISV 15% │ │ 30-day│ │ L 1,234.56│ │   │
//! │  │  └───────────┘ └─────────┘ └─────────┘ └───────┘ └───────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 factura-db (Database Layer)                     │   │
//! │  │      fiscal profiles, invoices, atomic next-number update       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`numbering`] - Correlative codec, sequence increment, format check
//! - [`range`] - Authorized range membership (three-tier fallback)
//! - [`totals`] - Line totals, discounts, ISV, grand total
//! - [`money`] - Money type in centavos, rounding, Lempira formatting
//! - [`cai`] - CAI expiration classification
//! - [`issuance`] - Pre-issue assessment combining range and CAI checks
//! - [`types`] - Domain records (FiscalProfile, Invoice, ...)
//! - [`validation`] - Strict checks for configuration input
//! - [`error`] - Domain error types
//!
//! ## Failure Policy
//!
//! The engine functions never panic and never return errors. Ambiguous
//! input resolves toward "allow": an unconfigured range admits every
//! number, an unparseable CAI date reads as far from expiry, and a number
//! that cannot be incremented comes back unchanged. The caller decides
//! whether to block.
//!
//! ## Example Usage
//!
//! ```rust
//! use factura_core::numbering::increment_invoice_number;
//! use factura_core::range::is_invoice_number_in_range;
//!
//! let next = increment_invoice_number("000-001-01-00000001");
//! assert_eq!(next, "000-001-01-00000002");
//!
//! assert!(is_invoice_number_in_range(
//!     &next,
//!     "000-001-01-00000001",
//!     "000-001-01-00005000",
//! ));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cai;
pub mod error;
pub mod issuance;
pub mod money;
pub mod numbering;
pub mod range;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cai::{check_cai_expiration, check_cai_expiration_on, CaiAdvisory, CaiStatus};
pub use error::{CoreError, ValidationError};
pub use issuance::{assess_issuance, BlockingReason, IssuanceAssessment};
pub use money::{format_currency, round2, Money};
pub use numbering::{
    checked_increment, increment_invoice_number, is_valid_invoice_number_format, Correlative,
};
pub use range::{is_invoice_number_in_range, InvoiceRange};
pub use totals::{
    calculate_discount, calculate_invoice_totals, calculate_line_total, Discount, DiscountMode,
    InvoiceTotals, LineItem,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default ISV rate in basis points (15%).
///
/// Applied whenever the fiscal profile does not carry its own rate.
pub const DEFAULT_TAX_RATE_BPS: u32 = 1500;

/// Days before CAI expiry during which the app warns the user.
pub const CAI_WARNING_DAYS: i64 = 30;

/// `days_until_expiry` reported when the stored CAI date cannot be read.
pub const CAI_UNKNOWN_DAYS: i64 = 999;

/// Longest invoice number accepted by the format check.
pub const MAX_INVOICE_NUMBER_LENGTH: usize = 50;

/// Lempira symbol used by [`money::format_currency`].
pub const CURRENCY_SYMBOL: &str = "L";
