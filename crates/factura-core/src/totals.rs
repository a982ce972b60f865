//! # Invoice Totals
//!
//! Line totals, discount, ISV and grand total.
//!
//! ## Round As You Go
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line_total     = round2(quantity × unit_price)        (per line)       │
//! │  subtotal       = round2(Σ line_total)                 ① ─┐             │
//! │  discount       = round2(subtotal × pct / 100)         ②  │ each step   │
//! │                   or round2(clamp(amount, 0, subtotal))   │ rounds its  │
//! │  taxable_amount = round2(subtotal − discount)          ③  │ own result, │
//! │  tax_amount     = round2(taxable_amount × tax_rate)    ④  │ in order    │
//! │  total          = round2(taxable_amount + tax_amount)  ⑤ ─┘             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The intermediate roundings are the ones printed on the fiscal document,
//! and reconciliation expects exactly these values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::TaxRate;

// =============================================================================
// Inputs
// =============================================================================

/// A quantity of something at a unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn new(quantity: u32, unit_price: Decimal) -> Self {
        LineItem {
            quantity,
            unit_price,
        }
    }

    /// See [`calculate_line_total`].
    pub fn line_total(&self) -> Money {
        calculate_line_total(self.quantity, self.unit_price)
    }
}

/// Which discount input the user picked in the invoice form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountMode {
    Percentage,
    Amount,
}

/// An invoice-level discount. At most one mode is active.
///
/// Percentages are not clamped: 150 gives a discount of 1.5 × subtotal.
/// Validating the 0-100 range is the caller's job
/// (see [`crate::validation::validate_discount_percentage`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum Discount {
    #[default]
    None,
    /// Percent of the subtotal, e.g. `10` for 10%.
    Percentage(Decimal),
    /// Fixed amount in Lempiras, clamped to `[0, subtotal]`.
    Amount(Decimal),
}

impl Discount {
    /// Builds the discount from the mode the user selected.
    pub fn new(mode: DiscountMode, value: Decimal) -> Self {
        match mode {
            DiscountMode::Percentage => Discount::Percentage(value),
            DiscountMode::Amount => Discount::Amount(value),
        }
    }

    pub fn mode(&self) -> Option<DiscountMode> {
        match self {
            Discount::None => None,
            Discount::Percentage(_) => Some(DiscountMode::Percentage),
            Discount::Amount(_) => Some(DiscountMode::Amount),
        }
    }
}

// =============================================================================
// Output
// =============================================================================

/// Every amount printed on the invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub taxable_amount: Money,
    pub tax_amount: Money,
    pub total: Money,
}

// =============================================================================
// Calculations
// =============================================================================

/// `round2(quantity × unit_price)`.
///
/// ```rust
/// use factura_core::totals::calculate_line_total;
/// use rust_decimal::Decimal;
///
/// let total = calculate_line_total(3, Decimal::new(1550, 2)); // 3 × 15.50
/// assert_eq!(total.cents(), 4650);
/// ```
pub fn calculate_line_total(quantity: u32, unit_price: Decimal) -> Money {
    Money::from_decimal(Decimal::from(quantity).saturating_mul(unit_price))
}

/// Discount amount for a given subtotal.
///
/// ```rust
/// use factura_core::money::Money;
/// use factura_core::totals::{calculate_discount, Discount};
/// use rust_decimal::Decimal;
///
/// let subtotal = Money::from_cents(100_000); // L 1,000.00
/// let fixed = calculate_discount(&Discount::Amount(Decimal::from(50)), subtotal);
/// assert_eq!(fixed.cents(), 5_000);
///
/// let capped = calculate_discount(&Discount::Amount(Decimal::from(5_000)), subtotal);
/// assert_eq!(capped, subtotal);
/// ```
pub fn calculate_discount(discount: &Discount, subtotal: Money) -> Money {
    let subtotal = subtotal.to_decimal();
    match *discount {
        Discount::None => Money::zero(),
        Discount::Percentage(pct) => {
            Money::from_decimal(subtotal.saturating_mul(pct) / Decimal::ONE_HUNDRED)
        }
        Discount::Amount(amount) => Money::from_decimal(amount.max(Decimal::ZERO).min(subtotal)),
    }
}

/// Computes all invoice amounts. `tax_rate` defaults to 15% ISV.
///
/// ## Example
/// ```rust
/// use factura_core::totals::{calculate_invoice_totals, Discount, LineItem};
/// use rust_decimal::Decimal;
///
/// let items = [
///     LineItem::new(3, Decimal::new(1550, 2)),
///     LineItem::new(1, Decimal::from(200)),
/// ];
/// let totals = calculate_invoice_totals(&items, &Discount::Percentage(Decimal::from(10)), None);
///
/// assert_eq!(totals.subtotal.cents(), 24650);
/// assert_eq!(totals.discount.cents(), 2465);
/// assert_eq!(totals.taxable_amount.cents(), 22185);
/// assert_eq!(totals.tax_amount.cents(), 3328);
/// assert_eq!(totals.total.cents(), 25513);
/// ```
pub fn calculate_invoice_totals(
    items: &[LineItem],
    discount: &Discount,
    tax_rate: Option<TaxRate>,
) -> InvoiceTotals {
    let tax_rate = tax_rate.unwrap_or_default();

    let line_sum: Money = items.iter().map(LineItem::line_total).sum();
    let subtotal = Money::from_decimal(line_sum.to_decimal());
    let discount = calculate_discount(discount, subtotal);
    let taxable_amount = Money::from_decimal(subtotal.to_decimal() - discount.to_decimal());
    let tax_amount =
        Money::from_decimal(taxable_amount.to_decimal().saturating_mul(tax_rate.fraction()));
    let total = Money::from_decimal(taxable_amount.to_decimal() + tax_amount.to_decimal());

    InvoiceTotals {
        subtotal,
        discount,
        taxable_amount,
        tax_amount,
        total,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
