//! # factura-db: Invoice Store for Factura HN
//!
//! SQLite persistence for fiscal profiles and issued invoices, built on
//! sqlx. This crate owns the one operation the engine cannot do alone:
//! reading a profile's next number, issuing with it and advancing it as a
//! single atomic step.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Factura HN Data Flow                             │
//! │                                                                         │
//! │  Invoice form (NewInvoice)                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   factura-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProfileRepo    │    │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │◄───│ InvoiceRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────┬────────┘    └──────────────┘  │   │
//! │  │                                │ numbering, range, totals, CAI  │   │
//! │  │                                ▼                                │   │
//! │  │                         factura-core                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (factura.db)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`config`] - Environment-driven store configuration
//! - [`error`] - Database error types
//! - [`repository`] - Profile and invoice repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use factura_db::{Database, StoreConfig};
//!
//! let config = StoreConfig::load()?;
//! let db = Database::new(config.db_config())
//!     .await?
//!     .with_issue_policy(config.issue_policy());
//!
//! let issued = db.invoices().issue(&profile_id, &draft).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, StoreConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::invoice::{InvoiceRepository, IssuePolicy, IssuedInvoice};
pub use repository::profile::ProfileRepository;
