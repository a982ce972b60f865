//! # Domain Types
//!
//! Records shared between the engine, the storage layer and the app.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────────┐   ┌───────────────┐ │
//! │  │   FiscalProfile     │   │      Invoice        │   │  InvoiceItem  │ │
//! │  │  ─────────────────  │   │  ─────────────────  │   │  ───────────  │ │
//! │  │  rtn                │──►│  invoice_number     │──►│  description  │ │
//! │  │  cai + expiry date  │   │  cai (snapshot)     │   │  quantity     │ │
//! │  │  range start / end  │   │  totals (centavos)  │   │  unit_price   │ │
//! │  │  next_invoice_number│   │  status             │   │  line_total   │ │
//! │  └─────────────────────┘   └─────────────────────┘   └───────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────────┐                     │
//! │  │      TaxRate        │   │   InvoiceStatus     │                     │
//! │  │  fraction (Decimal) │   │   Issued | Voided   │                     │
//! │  │  0.15 = ISV         │   └─────────────────────┘                     │
//! │  └─────────────────────┘                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::range::InvoiceRange;
use crate::totals::{Discount, InvoiceTotals, LineItem};
use crate::DEFAULT_TAX_RATE_BPS;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate as a decimal fraction (`0.15` = 15%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// Creates a tax rate from basis points (1500 = 15%).
    pub fn from_bps(bps: u32) -> Self {
        TaxRate(Decimal::new(i64::from(bps), 4))
    }

    /// Creates a tax rate from a fraction (`0.15`).
    pub const fn from_fraction(fraction: Decimal) -> Self {
        TaxRate(fraction)
    }

    /// Creates a tax rate from a percentage (`15`).
    pub fn from_percentage(pct: Decimal) -> Self {
        TaxRate(pct / Decimal::ONE_HUNDRED)
    }

    /// The Honduran sales tax (ISV), 15%.
    pub fn isv() -> Self {
        TaxRate::from_bps(DEFAULT_TAX_RATE_BPS)
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(Decimal::ZERO)
    }

    #[inline]
    pub const fn fraction(&self) -> Decimal {
        self.0
    }

    /// The rate as a percentage (for display only).
    pub fn percentage(&self) -> Decimal {
        self.0 * Decimal::ONE_HUNDRED
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

/// Absent rate means ISV.
impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::isv()
    }
}

// =============================================================================
// Fiscal Profile
// =============================================================================

/// The business's fiscal configuration: who issues, under which CAI, and
/// which numbers are still available.
///
/// Set by the user in profile settings; `next_invoice_number` is advanced
/// only by the storage layer after an invoice is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FiscalProfile {
    pub id: String,

    /// Legal name printed on the invoice header.
    pub business_name: String,

    /// Registro Tributario Nacional (14 digits).
    pub rtn: String,

    /// Código de Autorización de Impresión granted by the SAR.
    pub cai: String,

    /// CAI expiration as `YYYY-MM-DD`. Kept as text; read leniently.
    pub cai_expiration_date: String,

    /// First authorized invoice number.
    pub invoice_range_start: String,

    /// Last authorized invoice number.
    pub invoice_range_end: String,

    /// Number the next issued invoice will carry.
    pub next_invoice_number: String,

    #[ts(type = "string")]
    pub tax_rate: TaxRate,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl FiscalProfile {
    /// The authorized range as an [`InvoiceRange`].
    pub fn range(&self) -> InvoiceRange {
        InvoiceRange::new(&self.invoice_range_start, &self.invoice_range_end)
    }
}

// =============================================================================
// Invoice Status
// =============================================================================

/// Lifecycle of an issued invoice. Voiding never frees its number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Issued,
    Voided,
}

// =============================================================================
// Invoice
// =============================================================================

/// An issued fiscal invoice.
///
/// `cai` and `tax_rate` are snapshots taken at issue time so later profile
/// changes never alter a printed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub profile_id: String,
    pub invoice_number: String,
    pub cai: String,
    pub customer_name: String,
    pub customer_rtn: Option<String>,
    #[ts(as = "String")]
    pub issue_date: NaiveDate,
    pub status: InvoiceStatus,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub taxable_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    #[ts(type = "string")]
    pub tax_rate: TaxRate,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Stored amounts as [`InvoiceTotals`].
    pub fn totals(&self) -> InvoiceTotals {
        InvoiceTotals {
            subtotal: Money::from_cents(self.subtotal_cents),
            discount: Money::from_cents(self.discount_cents),
            taxable_amount: Money::from_cents(self.taxable_cents),
            tax_amount: Money::from_cents(self.tax_cents),
            total: Money::from_cents(self.total_cents),
        }
    }
}

// =============================================================================
// Invoice Item
// =============================================================================

/// A line on an issued invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    /// Position on the printed document, starting at 1.
    pub line_number: i64,
    pub description: String,
    pub quantity: i64,
    #[ts(type = "string")]
    pub unit_price: Decimal,
    pub line_total_cents: i64,
}

impl InvoiceItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Draft Input
// =============================================================================

/// What the invoice form submits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub customer_name: String,
    pub customer_rtn: Option<String>,
    pub issue_date: NaiveDate,
    pub items: Vec<NewInvoiceItem>,
    #[serde(default)]
    pub discount: Discount,
    pub notes: Option<String>,
}

impl NewInvoice {
    /// Items reduced to what the totals engine needs.
    pub fn line_items(&self) -> Vec<LineItem> {
        self.items
            .iter()
            .map(|item| LineItem::new(item.quantity, item.unit_price))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoiceItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tax_rate_constructors_agree() {
        assert_eq!(TaxRate::from_bps(1500), TaxRate::from_fraction(dec!(0.15)));
        assert_eq!(TaxRate::from_percentage(dec!(15)), TaxRate::isv());
        assert_eq!(TaxRate::isv().percentage(), dec!(15));
    }

    #[test]
    fn test_tax_rate_default_is_isv() {
        assert_eq!(TaxRate::default().fraction(), dec!(0.15));
        assert!(TaxRate::zero().is_zero());
    }

    #[test]
    fn test_invoice_status_default() {
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::Issued);
    }

    #[test]
    fn test_new_invoice_line_items() {
        let draft = NewInvoice {
            customer_name: "Consumidor Final".to_string(),
            customer_rtn: None,
            issue_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            items: vec![
                NewInvoiceItem {
                    description: "Consultoría".to_string(),
                    quantity: 3,
                    unit_price: dec!(15.50),
                },
                NewInvoiceItem {
                    description: "Viáticos".to_string(),
                    quantity: 1,
                    unit_price: dec!(200),
                },
            ],
            discount: Discount::None,
            notes: None,
        };

        let items = draft.line_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].line_total().cents(), 4650);
    }

    #[test]
    fn test_new_invoice_discount_defaults_when_missing() {
        let json = r#"{
            "customer_name": "Cliente",
            "customer_rtn": null,
            "issue_date": "2025-01-02",
            "items": [],
            "notes": null
        }"#;
        let draft: NewInvoice = serde_json::from_str(json).unwrap();
        assert_eq!(draft.discount, Discount::None);
    }
}
