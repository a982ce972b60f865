//! # Error Types
//!
//! Domain-specific error types for factura-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  factura-core errors (this file)                                       │
//! │  ├── CoreError        - Issuance refused by a caller-side policy       │
//! │  └── ValidationError  - Configuration / form input failures            │
//! │                                                                         │
//! │  factura-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → app                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine functions themselves (increment, range check, totals, CAI
//! check) never return these. They are produced by the strict validators
//! and by [`crate::issuance::IssuanceAssessment::ensure_issuable`], which
//! callers opt into.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Reasons a caller refuses to issue an invoice.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The CAI expiration date has passed.
    ///
    /// ## When This Occurs
    /// - The SAR authorization lapsed and the profile was not renewed
    /// - The device clock is ahead of the real date
    #[error("CAI {cai} expired {days_overdue} day(s) ago")]
    CaiExpired { cai: String, days_overdue: i64 },

    /// The next number lies outside the authorized range.
    ///
    /// ## When This Occurs
    /// - Every number of the range has been used
    /// - The next number was edited by hand past the end bound
    #[error("Invoice number {number} is outside the authorized range {start} to {end}")]
    OutOfRange {
        number: String,
        start: String,
        end: String,
    },

    /// The stored next number has no numeric correlative to advance.
    #[error("Invoice number '{0}' cannot be incremented")]
    NotIncrementable(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised when profile settings or invoice form input do not meet the
/// fiscal requirements. Used before anything is stored.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (RTN, CAI, date, invoice number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A collection that needs at least one element is empty.
    #[error("{field} must not be empty")]
    Empty { field: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid_format(field: &str, reason: &str) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::OutOfRange {
            number: "000-001-01-00005001".to_string(),
            start: "000-001-01-00000001".to_string(),
            end: "000-001-01-00005000".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invoice number 000-001-01-00005001 is outside the authorized range \
             000-001-01-00000001 to 000-001-01-00005000"
        );

        let err = CoreError::CaiExpired {
            cai: "ABC".to_string(),
            days_overdue: 3,
        };
        assert_eq!(err.to_string(), "CAI ABC expired 3 day(s) ago");
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("rtn").to_string(), "rtn is required");

        let err = ValidationError::OutOfRange {
            field: "discount percentage".to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "discount percentage must be between 0 and 100"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("cai").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
