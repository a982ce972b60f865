//! # Fiscal Profile Repository
//!
//! Database operations for fiscal profiles: the business identity (RTN),
//! the SAR authorization (CAI and its expiry), the authorized number range
//! and the next number to issue.
//!
//! `next_invoice_number` is written here only when a new authorization is
//! loaded. Day-to-day it is advanced by `InvoiceRepository::issue`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite, SqlitePool};
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::decode_decimal;
use factura_core::validation::validate_fiscal_profile;
use factura_core::{
    assess_issuance, checked_increment, FiscalProfile, IssuanceAssessment, TaxRate,
    ValidationError,
};

const PROFILE_COLUMNS: &str = r#"
    id, business_name, rtn, cai, cai_expiration_date,
    invoice_range_start, invoice_range_end, next_invoice_number,
    tax_rate, created_at, updated_at
"#;

/// Row shape of `fiscal_profiles`.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProfileRow {
    id: String,
    business_name: String,
    rtn: String,
    cai: String,
    cai_expiration_date: String,
    invoice_range_start: String,
    invoice_range_end: String,
    next_invoice_number: String,
    tax_rate: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for FiscalProfile {
    type Error = DbError;

    fn try_from(row: ProfileRow) -> DbResult<Self> {
        let tax_rate =
            TaxRate::from_fraction(decode_decimal("fiscal_profiles.tax_rate", &row.tax_rate)?);

        Ok(FiscalProfile {
            id: row.id,
            business_name: row.business_name,
            rtn: row.rtn,
            cai: row.cai,
            cai_expiration_date: row.cai_expiration_date,
            invoice_range_start: row.invoice_range_start,
            invoice_range_end: row.invoice_range_end,
            next_invoice_number: row.next_invoice_number,
            tax_rate,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Loads a profile through any executor (pool or open transaction).
pub(crate) async fn fetch_profile<'e, E>(executor: E, id: &str) -> DbResult<Option<FiscalProfile>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM fiscal_profiles WHERE id = ?1");
    let row: Option<ProfileRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    row.map(FiscalProfile::try_from).transpose()
}

/// A new SAR authorization for an existing profile.
///
/// When `next_invoice_number` is `None` the sequence starts at the range
/// start, skipping numbers this profile has already issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaiAuthorization {
    pub cai: String,
    pub cai_expiration_date: String,
    pub invoice_range_start: String,
    pub invoice_range_end: String,
    pub next_invoice_number: Option<String>,
}

/// Repository for fiscal profile database operations.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    /// Creates a new ProfileRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProfileRepository { pool }
    }

    /// Validates and inserts a profile.
    ///
    /// ## Errors
    /// * `DbError::Validation` - RTN, CAI, dates or range are malformed
    /// * `DbError::UniqueViolation` - the id already exists
    pub async fn create(&self, profile: &FiscalProfile) -> DbResult<FiscalProfile> {
        validate_fiscal_profile(profile)?;

        debug!(id = %profile.id, rtn = %profile.rtn, "Inserting fiscal profile");

        sqlx::query(
            r#"
            INSERT INTO fiscal_profiles (
                id, business_name, rtn, cai, cai_expiration_date,
                invoice_range_start, invoice_range_end, next_invoice_number,
                tax_rate, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.business_name)
        .bind(&profile.rtn)
        .bind(&profile.cai)
        .bind(&profile.cai_expiration_date)
        .bind(&profile.invoice_range_start)
        .bind(&profile.invoice_range_end)
        .bind(&profile.next_invoice_number)
        .bind(profile.tax_rate.fraction().to_string())
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %profile.id, cai = %profile.cai, "Fiscal profile created");
        Ok(profile.clone())
    }

    /// Gets a profile by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<FiscalProfile>> {
        fetch_profile(&self.pool, id).await
    }

    /// Loads a new CAI authorization and range into the profile.
    ///
    /// The resulting profile is validated as a whole before anything is
    /// written, so a range that does not contain its next number is
    /// rejected. Numbers this profile already issued are never handed out
    /// again, whether given explicitly or reached from the range start.
    pub async fn update_range(
        &self,
        id: &str,
        authorization: &CaiAuthorization,
    ) -> DbResult<FiscalProfile> {
        let current = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("FiscalProfile", id))?;

        let issued = self.issued_numbers(id).await?;
        let next_invoice_number = match &authorization.next_invoice_number {
            Some(next) if issued.contains(next.trim()) => {
                return Err(ValidationError::InvalidFormat {
                    field: "next_invoice_number".to_string(),
                    reason: format!("{next} was already issued"),
                }
                .into());
            }
            Some(next) => next.clone(),
            None => first_unissued(&authorization.invoice_range_start, &issued)?,
        };

        let updated = FiscalProfile {
            cai: authorization.cai.clone(),
            cai_expiration_date: authorization.cai_expiration_date.clone(),
            invoice_range_start: authorization.invoice_range_start.clone(),
            invoice_range_end: authorization.invoice_range_end.clone(),
            next_invoice_number,
            updated_at: Utc::now(),
            ..current
        };
        validate_fiscal_profile(&updated)?;

        let result = sqlx::query(
            r#"
            UPDATE fiscal_profiles SET
                cai = ?1,
                cai_expiration_date = ?2,
                invoice_range_start = ?3,
                invoice_range_end = ?4,
                next_invoice_number = ?5,
                updated_at = ?6
            WHERE id = ?7
            "#,
        )
        .bind(&updated.cai)
        .bind(&updated.cai_expiration_date)
        .bind(&updated.invoice_range_start)
        .bind(&updated.invoice_range_end)
        .bind(&updated.next_invoice_number)
        .bind(updated.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("FiscalProfile", id));
        }

        info!(
            id = %id,
            cai = %updated.cai,
            start = %updated.invoice_range_start,
            end = %updated.invoice_range_end,
            "CAI authorization loaded"
        );
        Ok(updated)
    }

    /// Every invoice number this profile has used, voided ones included.
    async fn issued_numbers(&self, id: &str) -> DbResult<HashSet<String>> {
        let numbers: Vec<String> =
            sqlx::query_scalar("SELECT invoice_number FROM invoices WHERE profile_id = ?1")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;

        Ok(numbers.into_iter().collect())
    }

    /// The number the next issued invoice will carry.
    pub async fn next_invoice_number(&self, id: &str) -> DbResult<String> {
        let next: Option<String> =
            sqlx::query_scalar("SELECT next_invoice_number FROM fiscal_profiles WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        next.ok_or_else(|| DbError::not_found("FiscalProfile", id))
    }

    /// Range and CAI advisory for the profile's next number.
    pub async fn assess(&self, id: &str, today: NaiveDate) -> DbResult<IssuanceAssessment> {
        let profile = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("FiscalProfile", id))?;

        Ok(assess_issuance(&profile, today))
    }
}

/// First number from `start` onward that has not been issued.
fn first_unissued(start: &str, issued: &HashSet<String>) -> DbResult<String> {
    let mut candidate = start.trim().to_string();
    while issued.contains(&candidate) {
        candidate = checked_increment(&candidate)?;
    }
    Ok(candidate)
}

/// Helper to generate a new profile ID.
pub fn generate_profile_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
