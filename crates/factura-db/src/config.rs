//! Store configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                    | Default          |
//! |-----------------------------|------------------|
//! | `FACTURA_DB_PATH`           | `./factura.db`   |
//! | `FACTURA_DEFAULT_TAX_RATE`  | `0.15`           |
//! | `FACTURA_MAX_ISSUE_RETRIES` | `5`              |
//! | `FACTURA_LOG`               | unset (use `RUST_LOG`) |

use factura_core::TaxRate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::pool::DbConfig;
use crate::repository::invoice::IssuePolicy;

/// Default log filter for binaries.
pub const DEFAULT_LOG_FILTER: &str = "info,factura=debug,sqlx=warn";

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Tax rate given to new profiles that do not set one
    pub default_tax_rate: TaxRate,

    /// How many times a lost sequence race is retried
    pub max_issue_retries: u32,

    /// Tracing filter directive
    pub log_filter: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            database_path: PathBuf::from("./factura.db"),
            default_tax_rate: TaxRate::isv(),
            max_issue_retries: IssuePolicy::DEFAULT_MAX_RETRIES,
            log_filter: None,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = StoreConfig::default();

        let database_path = lookup("FACTURA_DB_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let default_tax_rate = match lookup("FACTURA_DEFAULT_TAX_RATE") {
            Some(raw) => parse_tax_rate(&raw)?,
            None => defaults.default_tax_rate,
        };

        let max_issue_retries = match lookup("FACTURA_MAX_ISSUE_RETRIES") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("FACTURA_MAX_ISSUE_RETRIES".to_string()))?,
            None => defaults.max_issue_retries,
        };

        Ok(StoreConfig {
            database_path,
            default_tax_rate,
            max_issue_retries,
            log_filter: lookup("FACTURA_LOG").filter(|v| !v.trim().is_empty()),
        })
    }

    /// Pool configuration for this store.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
    }

    pub fn issue_policy(&self) -> IssuePolicy {
        IssuePolicy::default().max_retries(self.max_issue_retries)
    }

    /// Filter for `tracing_subscriber::EnvFilter`.
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

/// Tax rate as a fraction in [0, 1], e.g. "0.15".
fn parse_tax_rate(raw: &str) -> Result<TaxRate, ConfigError> {
    let invalid = || ConfigError::InvalidValue("FACTURA_DEFAULT_TAX_RATE".to_string());
    let fraction = Decimal::from_str(raw.trim()).map_err(|_| invalid())?;
    if fraction < Decimal::ZERO || fraction > Decimal::ONE {
        return Err(invalid());
    }
    Ok(TaxRate::from_fraction(fraction))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
