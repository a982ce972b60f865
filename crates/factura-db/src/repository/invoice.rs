//! # Invoice Repository
//!
//! Issues fiscal invoices and reads them back.
//!
//! ## Issue Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  issue(profile_id, draft)                                               │
//! │                                                                         │
//! │  validate_new_invoice(draft)                                            │
//! │       │                                                                 │
//! │  BEGIN ─────────────────────────────────────────────────────────┐       │
//! │  │ 1. touch profile row           (takes the write lock first)  │       │
//! │  │ 2. read profile                (next number N)               │       │
//! │  │ 3. assess_issuance(today)      (CAI expired? N in range?)    │       │
//! │  │ 4. checked_increment(N)        (N+1, or SequenceStalled)     │       │
//! │  │ 5. calculate_invoice_totals                                  │       │
//! │  │ 6. INSERT invoice N + items                                  │       │
//! │  │ 7. UPDATE next = N+1 WHERE next = N   (0 rows → lost race)   │       │
//! │  COMMIT ────────────────────────────────────────────────────────┘       │
//! │       │                                                                 │
//! │  ConcurrentUpdate / Busy ──► retry from BEGIN (IssuePolicy::max_retries)│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error before COMMIT drops the transaction, which rolls it back:
//! a refused or failed issue never consumes a number.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::profile::fetch_profile;
use crate::repository::{decode_date, decode_decimal};
use factura_core::cai::parse_expiration_date;
use factura_core::validation::validate_new_invoice;
use factura_core::{
    assess_issuance, calculate_invoice_totals, calculate_line_total, checked_increment,
    BlockingReason, IssuanceAssessment, Invoice, InvoiceItem, InvoiceStatus, NewInvoice, TaxRate,
};

// =============================================================================
// Issue Policy
// =============================================================================

/// Which advisory conditions stop an issue, and how hard to retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuePolicy {
    /// Refuse to issue once the CAI has expired.
    pub block_expired_cai: bool,

    /// Refuse to issue a number outside the authorized range.
    pub block_out_of_range: bool,

    /// Retries after a lost race on the sequence.
    pub max_retries: u32,
}

impl IssuePolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 5;

    pub fn block_expired_cai(mut self, block: bool) -> Self {
        self.block_expired_cai = block;
        self
    }

    pub fn block_out_of_range(mut self, block: bool) -> Self {
        self.block_out_of_range = block;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn blocks(&self, reason: BlockingReason) -> bool {
        match reason {
            BlockingReason::CaiExpired => self.block_expired_cai,
            BlockingReason::OutOfRange => self.block_out_of_range,
        }
    }
}

impl Default for IssuePolicy {
    fn default() -> Self {
        IssuePolicy {
            block_expired_cai: true,
            block_out_of_range: true,
            max_retries: Self::DEFAULT_MAX_RETRIES,
        }
    }
}

/// An invoice as stored, with the assessment it was issued under.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedInvoice {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
    pub assessment: IssuanceAssessment,
}

// =============================================================================
// Rows
// =============================================================================

const INVOICE_COLUMNS: &str = r#"
    id, profile_id, invoice_number, cai, customer_name, customer_rtn,
    issue_date, status, subtotal_cents, discount_cents, taxable_cents,
    tax_cents, total_cents, tax_rate, notes, created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    profile_id: String,
    invoice_number: String,
    cai: String,
    customer_name: String,
    customer_rtn: Option<String>,
    issue_date: String,
    status: InvoiceStatus,
    subtotal_cents: i64,
    discount_cents: i64,
    taxable_cents: i64,
    tax_cents: i64,
    total_cents: i64,
    tax_rate: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DbError;

    fn try_from(row: InvoiceRow) -> DbResult<Self> {
        Ok(Invoice {
            issue_date: decode_date("invoices.issue_date", &row.issue_date)?,
            tax_rate: TaxRate::from_fraction(decode_decimal("invoices.tax_rate", &row.tax_rate)?),
            id: row.id,
            profile_id: row.profile_id,
            invoice_number: row.invoice_number,
            cai: row.cai,
            customer_name: row.customer_name,
            customer_rtn: row.customer_rtn,
            status: row.status,
            subtotal_cents: row.subtotal_cents,
            discount_cents: row.discount_cents,
            taxable_cents: row.taxable_cents,
            tax_cents: row.tax_cents,
            total_cents: row.total_cents,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceItemRow {
    id: String,
    invoice_id: String,
    line_number: i64,
    description: String,
    quantity: i64,
    unit_price: String,
    line_total_cents: i64,
}

impl TryFrom<InvoiceItemRow> for InvoiceItem {
    type Error = DbError;

    fn try_from(row: InvoiceItemRow) -> DbResult<Self> {
        Ok(InvoiceItem {
            unit_price: decode_decimal("invoice_items.unit_price", &row.unit_price)?,
            id: row.id,
            invoice_id: row.invoice_id,
            line_number: row.line_number,
            description: row.description,
            quantity: row.quantity,
            line_total_cents: row.line_total_cents,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
    policy: IssuePolicy,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository with the default policy.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository {
            pool,
            policy: IssuePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: IssuePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &IssuePolicy {
        &self.policy
    }

    /// Issues an invoice with the profile's next number and advances it.
    ///
    /// ## Errors
    /// * `DbError::Validation` - the draft is malformed; nothing was read
    /// * `DbError::NotFound` - no such profile
    /// * `DbError::CaiExpired` / `DbError::OutOfRange` - blocked by policy
    /// * `DbError::SequenceStalled` - the next number cannot be advanced
    /// * `DbError::ConcurrentUpdate` / `DbError::Busy` - retries exhausted
    ///
    /// ## Example
    /// ```rust,ignore
    /// let issued = db.invoices().issue(&profile.id, &draft).await?;
    /// println!("{} {}", issued.invoice.invoice_number, issued.invoice.totals().total);
    /// ```
    pub async fn issue(&self, profile_id: &str, draft: &NewInvoice) -> DbResult<IssuedInvoice> {
        self.issue_on(profile_id, draft, Local::now().date_naive()).await
    }

    /// [`InvoiceRepository::issue`] with an explicit current date.
    ///
    /// CAI expiry is judged against `today`, never against the draft's
    /// `issue_date`. A draft dated after the CAI expiry is refused as well.
    pub async fn issue_on(
        &self,
        profile_id: &str,
        draft: &NewInvoice,
        today: NaiveDate,
    ) -> DbResult<IssuedInvoice> {
        validate_new_invoice(draft)?;

        let mut attempt: u32 = 0;
        loop {
            match self.try_issue(profile_id, draft, today).await {
                Err(err) if err.is_retryable() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    warn!(
                        profile_id = %profile_id,
                        attempt,
                        error = %err,
                        "Retrying invoice issue"
                    );
                    tokio::task::yield_now().await;
                }
                result => return result,
            }
        }
    }

    /// One attempt of the issue transaction.
    async fn try_issue(
        &self,
        profile_id: &str,
        draft: &NewInvoice,
        today: NaiveDate,
    ) -> DbResult<IssuedInvoice> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Writing first makes SQLite take the write lock before the read,
        // so the next number read below cannot go stale.
        let touched = sqlx::query("UPDATE fiscal_profiles SET updated_at = ?1 WHERE id = ?2")
            .bind(now)
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(DbError::not_found("FiscalProfile", profile_id));
        }

        let profile = fetch_profile(&mut *tx, profile_id)
            .await?
            .ok_or_else(|| DbError::not_found("FiscalProfile", profile_id))?;

        let assessment = assess_issuance(&profile, today);
        for reason in assessment.blocking_reasons() {
            if self.policy.blocks(reason) {
                return Err(assessment.error_for(reason, &profile).into());
            }
            warn!(
                profile_id = %profile_id,
                invoice_number = %assessment.invoice_number,
                reason = ?reason,
                "Issuing despite advisory"
            );
        }

        if self.policy.block_expired_cai {
            if let Some(expires) = parse_expiration_date(&profile.cai_expiration_date) {
                if draft.issue_date > expires {
                    return Err(DbError::CaiExpired {
                        cai: profile.cai.clone(),
                        days_overdue: (draft.issue_date - expires).num_days(),
                    });
                }
            }
        }

        let number = assessment.invoice_number.clone();
        let next = checked_increment(&number)?;

        let totals =
            calculate_invoice_totals(&draft.line_items(), &draft.discount, Some(profile.tax_rate));

        let invoice = Invoice {
            id: Uuid::new_v4().to_string(),
            profile_id: profile.id.clone(),
            invoice_number: number.clone(),
            cai: profile.cai.clone(),
            customer_name: draft.customer_name.trim().to_string(),
            customer_rtn: draft
                .customer_rtn
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
            issue_date: draft.issue_date,
            status: InvoiceStatus::Issued,
            subtotal_cents: totals.subtotal.cents(),
            discount_cents: totals.discount.cents(),
            taxable_cents: totals.taxable_amount.cents(),
            tax_cents: totals.tax_amount.cents(),
            total_cents: totals.total.cents(),
            tax_rate: profile.tax_rate,
            notes: draft.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %invoice.id, invoice_number = %number, "Inserting invoice");
        insert_invoice(&mut *tx, &invoice).await.map_err(|err| match err {
            DbError::UniqueViolation { field, .. } if field.contains("invoice_number") => {
                DbError::UniqueViolation {
                    field,
                    value: number.clone(),
                }
            }
            other => other,
        })?;

        let mut items = Vec::with_capacity(draft.items.len());
        for (idx, line) in draft.items.iter().enumerate() {
            let item = InvoiceItem {
                id: Uuid::new_v4().to_string(),
                invoice_id: invoice.id.clone(),
                line_number: idx as i64 + 1,
                description: line.description.trim().to_string(),
                quantity: i64::from(line.quantity),
                unit_price: line.unit_price,
                line_total_cents: calculate_line_total(line.quantity, line.unit_price).cents(),
            };
            insert_item(&mut *tx, &item).await?;
            items.push(item);
        }

        advance_sequence(&mut *tx, profile_id, &number, &next, now).await?;

        tx.commit().await?;

        info!(
            profile_id = %profile_id,
            invoice_number = %number,
            next_invoice_number = %next,
            total = %totals.total,
            "Invoice issued"
        );

        Ok(IssuedInvoice {
            invoice,
            items,
            assessment,
        })
    }

    /// Gets an invoice by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1");
        let row: Option<InvoiceRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Invoice::try_from).transpose()
    }

    /// Items of an invoice in printed order.
    pub async fn get_items(&self, invoice_id: &str) -> DbResult<Vec<InvoiceItem>> {
        let rows: Vec<InvoiceItemRow> = sqlx::query_as(
            r#"
            SELECT id, invoice_id, line_number, description, quantity, unit_price, line_total_cents
            FROM invoice_items
            WHERE invoice_id = ?1
            ORDER BY line_number
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(InvoiceItem::try_from).collect()
    }

    /// Most recent invoices of a profile, newest first.
    pub async fn list_for_profile(&self, profile_id: &str, limit: u32) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE profile_id = ?1 \
             ORDER BY created_at DESC, invoice_number DESC LIMIT ?2"
        );
        let rows: Vec<InvoiceRow> = sqlx::query_as(&sql)
            .bind(profile_id)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Invoice::try_from).collect()
    }

    /// Voids an issued invoice.
    ///
    /// Only the status changes. The number stays consumed and the
    /// profile's sequence is untouched. Voiding twice is a no-op.
    pub async fn void(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Voiding invoice");

        let result = sqlx::query(
            "UPDATE invoices SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        )
        .bind(InvoiceStatus::Voided)
        .bind(Utc::now())
        .bind(id)
        .bind(InvoiceStatus::Issued)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<String> = sqlx::query_scalar("SELECT id FROM invoices WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            if exists.is_none() {
                return Err(DbError::not_found("Invoice", id));
            }
            return Ok(());
        }

        info!(id = %id, "Invoice voided");
        Ok(())
    }
}

// =============================================================================
// Statements
// =============================================================================

async fn insert_invoice<'e, E>(executor: E, invoice: &Invoice) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, profile_id, invoice_number, cai, customer_name, customer_rtn,
            issue_date, status, subtotal_cents, discount_cents, taxable_cents,
            tax_cents, total_cents, tax_rate, notes, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11,
            ?12, ?13, ?14, ?15, ?16, ?17
        )
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.profile_id)
    .bind(&invoice.invoice_number)
    .bind(&invoice.cai)
    .bind(&invoice.customer_name)
    .bind(&invoice.customer_rtn)
    .bind(invoice.issue_date.format("%Y-%m-%d").to_string())
    .bind(invoice.status)
    .bind(invoice.subtotal_cents)
    .bind(invoice.discount_cents)
    .bind(invoice.taxable_cents)
    .bind(invoice.tax_cents)
    .bind(invoice.total_cents)
    .bind(invoice.tax_rate.fraction().to_string())
    .bind(&invoice.notes)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

async fn insert_item<'e, E>(executor: E, item: &InvoiceItem) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO invoice_items (
            id, invoice_id, line_number, description, quantity, unit_price, line_total_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&item.id)
    .bind(&item.invoice_id)
    .bind(item.line_number)
    .bind(&item.description)
    .bind(item.quantity)
    .bind(item.unit_price.to_string())
    .bind(item.line_total_cents)
    .execute(executor)
    .await?;

    Ok(())
}

/// Compare-and-swap of the profile's next number.
///
/// Succeeds only while the stored value is still `current`.
async fn advance_sequence<'e, E>(
    executor: E,
    profile_id: &str,
    current: &str,
    next: &str,
    now: DateTime<Utc>,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE fiscal_profiles
        SET next_invoice_number = ?1, updated_at = ?2
        WHERE id = ?3 AND next_invoice_number = ?4
        "#,
    )
    .bind(next)
    .bind(now)
    .bind(profile_id)
    .bind(current)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::ConcurrentUpdate {
            profile_id: profile_id.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::profile::tests::sample_profile;
    use chrono::NaiveDate;
    use factura_core::{Discount, FiscalProfile, NewInvoiceItem};
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn on(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn create(db: &Database, profile: FiscalProfile) -> FiscalProfile {
        db.profiles().create(&profile).await.unwrap()
    }

    fn draft(day: u32) -> NewInvoice {
        NewInvoice {
            customer_name: "Comercial Los Pinos".to_string(),
            customer_rtn: Some("05019001234567".to_string()),
            issue_date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            items: vec![
                NewInvoiceItem {
                    description: "Cemento gris 42.5 kg".to_string(),
                    quantity: 2,
                    unit_price: dec!(100.00),
                },
                NewInvoiceItem {
                    description: "Clavos 3\"".to_string(),
                    quantity: 2,
                    unit_price: dec!(10.005),
                },
            ],
            discount: Discount::Percentage(dec!(10)),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_issue_assigns_number_and_advances() {
        let db = setup().await;
        let profile = create(&db, sample_profile()).await;

        let issued = db.invoices().issue_on(&profile.id, &draft(1), today()).await.unwrap();

        assert_eq!(issued.invoice.invoice_number, "000-001-01-00000001");
        assert_eq!(issued.invoice.cai, profile.cai);
        assert_eq!(issued.invoice.status, InvoiceStatus::Issued);
        assert_eq!(issued.assessment.remaining, Some(100));

        // 200.00 + 20.01 = 220.01; 10% = 22.00; taxable 198.01; ISV 29.70
        let totals = issued.invoice.totals();
        assert_eq!(totals.subtotal.cents(), 22001);
        assert_eq!(totals.discount.cents(), 2200);
        assert_eq!(totals.taxable_amount.cents(), 19801);
        assert_eq!(totals.tax_amount.cents(), 2970);
        assert_eq!(totals.total.cents(), 22771);

        let next = db.profiles().next_invoice_number(&profile.id).await.unwrap();
        assert_eq!(next, "000-001-01-00000002");

        let stored = db
            .invoices()
            .get_by_id(&issued.invoice.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, issued.invoice);

        let items = db.invoices().get_items(&issued.invoice.id).await.unwrap();
        assert_eq!(items, issued.items);
        assert_eq!(items[0].line_number, 1);
        assert_eq!(items[1].unit_price, dec!(10.005));
        assert_eq!(items[1].line_total_cents, 2001);
    }

    #[tokio::test]
    async fn test_consecutive_issues() {
        let db = setup().await;
        let profile = create(&db, sample_profile()).await;

        let mut numbers = Vec::new();
        for _ in 0..3 {
            let issued = db.invoices().issue_on(&profile.id, &draft(1), today()).await.unwrap();
            numbers.push(issued.invoice.invoice_number);
        }
        assert_eq!(
            numbers,
            vec![
                "000-001-01-00000001",
                "000-001-01-00000002",
                "000-001-01-00000003"
            ]
        );

        let listed = db.invoices().list_for_profile(&profile.id, 2).await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_expired_cai_blocks_without_consuming_number() {
        let db = setup().await;
        let mut profile = sample_profile();
        profile.cai_expiration_date = "2025-05-31".to_string();
        let profile = create(&db, profile).await;

        let err = db
            .invoices()
            .issue_on(&profile.id, &draft(2), on(6, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CaiExpired { days_overdue: 2, .. }));

        let next = db.profiles().next_invoice_number(&profile.id).await.unwrap();
        assert_eq!(next, "000-001-01-00000001");
        assert!(db
            .invoices()
            .list_for_profile(&profile.id, 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_backdated_draft_cannot_bypass_expired_cai() {
        let db = setup().await;
        let mut profile = sample_profile();
        profile.cai_expiration_date = "2025-05-31".to_string();
        let profile = create(&db, profile).await;

        // dated while the CAI was still valid, issued after it lapsed
        let mut backdated = draft(1);
        backdated.issue_date = on(5, 15);
        let err = db
            .invoices()
            .issue_on(&profile.id, &backdated, on(6, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CaiExpired { days_overdue: 10, .. }));

        let next = db.profiles().next_invoice_number(&profile.id).await.unwrap();
        assert_eq!(next, "000-001-01-00000001");
    }

    #[tokio::test]
    async fn test_issue_uses_the_local_clock() {
        let db = setup().await;

        // sample_profile's CAI lapsed on 2025-12-31
        let expired = create(&db, sample_profile()).await;
        let err = db.invoices().issue(&expired.id, &draft(1)).await.unwrap_err();
        assert!(matches!(err, DbError::CaiExpired { .. }));

        let local_today = Local::now().date_naive();
        let mut current = sample_profile();
        current.cai_expiration_date = (local_today + chrono::Duration::days(365))
            .format("%Y-%m-%d")
            .to_string();
        let current = create(&db, current).await;

        let mut dated_today = draft(1);
        dated_today.issue_date = local_today;
        let issued = db.invoices().issue(&current.id, &dated_today).await.unwrap();
        assert_eq!(issued.invoice.invoice_number, "000-001-01-00000001");
        assert!(!issued.assessment.cai.is_expired);
    }

    #[tokio::test]
    async fn test_draft_dated_after_cai_expiry_is_refused() {
        let db = setup().await;
        let profile = create(&db, sample_profile()).await;

        let mut postdated = draft(1);
        postdated.issue_date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let err = db
            .invoices()
            .issue_on(&profile.id, &postdated, today())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CaiExpired { days_overdue: 5, .. }));

        let lenient = db
            .invoices()
            .with_policy(IssuePolicy::default().block_expired_cai(false));
        let issued = lenient.issue_on(&profile.id, &postdated, today()).await.unwrap();
        assert_eq!(issued.invoice.issue_date, postdated.issue_date);
    }

    #[tokio::test]
    async fn test_range_exhaustion() {
        let db = setup().await;
        let mut profile = sample_profile();
        profile.next_invoice_number = "000-001-01-00000100".to_string();
        let profile = create(&db, profile).await;

        let last = db.invoices().issue_on(&profile.id, &draft(1), today()).await.unwrap();
        assert_eq!(last.invoice.invoice_number, "000-001-01-00000100");

        let err = db.invoices().issue_on(&profile.id, &draft(1), today()).await.unwrap_err();
        match err {
            DbError::OutOfRange { number, end, .. } => {
                assert_eq!(number, "000-001-01-00000101");
                assert_eq!(end, "000-001-01-00000100");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lenient_policy_issues_with_warning() {
        let db = setup().await;
        let mut profile = sample_profile();
        profile.next_invoice_number = "000-001-01-00000100".to_string();
        let profile = create(&db, profile).await;

        let invoices = db
            .invoices()
            .with_policy(IssuePolicy::default().block_out_of_range(false));
        invoices.issue_on(&profile.id, &draft(1), today()).await.unwrap();

        let issued = invoices.issue_on(&profile.id, &draft(1), today()).await.unwrap();
        assert_eq!(issued.invoice.invoice_number, "000-001-01-00000101");
        assert!(!issued.assessment.in_range);
    }

    #[tokio::test]
    async fn test_non_incrementable_number_stalls() {
        let db = setup().await;
        let mut profile = sample_profile();
        profile.invoice_range_start = "FAC-AAA".to_string();
        profile.invoice_range_end = "FAC-ZZZ".to_string();
        profile.next_invoice_number = "FAC-ABC".to_string();
        let profile = create(&db, profile).await;

        let err = db.invoices().issue_on(&profile.id, &draft(1), today()).await.unwrap_err();
        assert!(matches!(err, DbError::SequenceStalled { ref number } if number == "FAC-ABC"));

        let next = db.profiles().next_invoice_number(&profile.id).await.unwrap();
        assert_eq!(next, "FAC-ABC");
        assert!(db
            .invoices()
            .list_for_profile(&profile.id, 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_invalid_draft_rejected() {
        let db = setup().await;
        let profile = create(&db, sample_profile()).await;

        let mut bad = draft(1);
        bad.items.clear();
        let err = db.invoices().issue_on(&profile.id, &bad, today()).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let next = db.profiles().next_invoice_number(&profile.id).await.unwrap();
        assert_eq!(next, "000-001-01-00000001");
    }

    #[tokio::test]
    async fn test_unknown_profile() {
        let db = setup().await;
        let err = db.invoices().issue_on("missing", &draft(1), today()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_void_keeps_number_consumed() {
        let db = setup().await;
        let profile = create(&db, sample_profile()).await;

        let issued = db.invoices().issue_on(&profile.id, &draft(1), today()).await.unwrap();
        db.invoices().void(&issued.invoice.id).await.unwrap();
        db.invoices().void(&issued.invoice.id).await.unwrap();

        let stored = db
            .invoices()
            .get_by_id(&issued.invoice.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, InvoiceStatus::Voided);

        let next = db.invoices().issue_on(&profile.id, &draft(1), today()).await.unwrap();
        assert_eq!(next.invoice.invoice_number, "000-001-01-00000002");

        assert!(matches!(
            db.invoices().void("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_issues_get_distinct_numbers() {
        let path = std::env::temp_dir().join(format!("factura-test-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(8))
            .await
            .unwrap()
            .with_issue_policy(IssuePolicy::default().max_retries(50));
        let profile = create(&db, sample_profile()).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let invoices = db.invoices();
            let profile_id = profile.id.clone();
            handles.push(tokio::spawn(async move {
                let mut numbers = Vec::new();
                for _ in 0..5 {
                    let issued = invoices.issue_on(&profile_id, &draft(1), today()).await.unwrap();
                    numbers.push(issued.invoice.invoice_number);
                }
                numbers
            }));
        }

        let mut all = HashSet::new();
        for handle in handles {
            for number in handle.await.unwrap() {
                assert!(all.insert(number), "number issued twice");
            }
        }
        assert_eq!(all.len(), 40);

        let next = db.profiles().next_invoice_number(&profile.id).await.unwrap();
        assert_eq!(next, "000-001-01-00000041");

        db.close().await;
        let _ = std::fs::remove_file(&path);
    }
}
