//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error ───────────┐                                               │
//! │  CoreError (blocked) ───┼──► DbError (this module) ──► app dialog       │
//! │  ValidationError ───────┘                                               │
//! │                                                                         │
//! │  ConcurrentUpdate / Busy are retried inside InvoiceRepository::issue   │
//! │  and only surface once the retry limit is reached.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use factura_core::{CoreError, ValidationError};
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - The same invoice number inserted twice for one profile
    /// - Duplicate primary key
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The profile's next number changed between read and write.
    ///
    /// ## When This Occurs
    /// - Two devices issued against the same profile at the same moment
    #[error("Invoice sequence for profile {profile_id} was advanced concurrently")]
    ConcurrentUpdate { profile_id: String },

    /// SQLite reported the database as locked.
    #[error("Database is busy: {0}")]
    Busy(String),

    /// The stored next number cannot be advanced.
    ///
    /// Persisting it unchanged would issue the same fiscal number twice,
    /// so issuing stops here instead.
    #[error("Invoice number '{number}' cannot be incremented")]
    SequenceStalled { number: String },

    /// A stored value could not be decoded.
    #[error("Corrupt value in {column}: '{value}'")]
    CorruptValue { column: String, value: String },

    /// The profile's CAI expired; issuing is refused.
    #[error("CAI {cai} expired {days_overdue} day(s) ago")]
    CaiExpired { cai: String, days_overdue: i64 },

    /// The next number is outside the authorized range; issuing is refused.
    #[error("Invoice number {number} is outside the authorized range {start} to {end}")]
    OutOfRange {
        number: String,
        start: String,
        end: String,
    },

    /// Any other engine error.
    #[error(transparent)]
    Core(CoreError),

    /// Input rejected before touching the database.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn corrupt(column: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::CorruptValue {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Worth retrying the whole issue transaction.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::ConcurrentUpdate { .. } | DbError::Busy(_))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → constraint type or Busy from the message
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("database is locked") || msg.contains("database is busy") {
                    DbError::Busy(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

/// Lifts engine errors into their storage counterparts.
///
/// ```text
/// CoreError::CaiExpired        → DbError::CaiExpired
/// CoreError::OutOfRange        → DbError::OutOfRange
/// CoreError::NotIncrementable  → DbError::SequenceStalled
/// CoreError::Validation        → DbError::Validation
/// ```
impl From<CoreError> for DbError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::CaiExpired { cai, days_overdue } => DbError::CaiExpired { cai, days_overdue },
            CoreError::OutOfRange { number, start, end } => {
                DbError::OutOfRange { number, start, end }
            }
            CoreError::NotIncrementable(number) => DbError::SequenceStalled { number },
            CoreError::Validation(v) => DbError::Validation(v),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(DbError::ConcurrentUpdate {
            profile_id: "p".to_string()
        }
        .is_retryable());
        assert!(DbError::Busy("locked".to_string()).is_retryable());
        assert!(!DbError::not_found("Invoice", "x").is_retryable());
        assert!(!DbError::SequenceStalled {
            number: "ABC".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_core_errors_map_to_storage_variants() {
        let err: DbError = CoreError::NotIncrementable("X".to_string()).into();
        assert!(matches!(err, DbError::SequenceStalled { ref number } if number == "X"));
        assert_eq!(err.to_string(), "Invoice number 'X' cannot be incremented");

        let err: DbError = CoreError::CaiExpired {
            cai: "ABC".to_string(),
            days_overdue: 2,
        }
        .into();
        assert!(matches!(err, DbError::CaiExpired { days_overdue: 2, .. }));
    }
}
