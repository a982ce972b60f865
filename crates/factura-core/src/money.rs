//! # Money Module
//!
//! Provides the `Money` type for rounded monetary values in Lempiras, plus
//! the rounding and formatting rules every fiscal document uses.
//!
//! ## Two Kinds of Numbers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INPUTS (Decimal)                     OUTPUTS (Money, i64 centavos)     │
//! │                                                                         │
//! │  unit_price   10.005                  line_total     20.01              │
//! │  percentage   10                      subtotal       246.50             │
//! │  tax_rate     0.15                    tax_amount     33.28              │
//! │                                                                         │
//! │  Inputs may carry any precision. Every derived amount passes through   │
//! │  round2() exactly once and is then held as whole centavos.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use factura_core::money::{format_currency, Money};
//! use rust_decimal::Decimal;
//!
//! let price = Money::from_cents(123_456);
//! assert_eq!(price.to_string(), "L 1,234.56");
//!
//! let tax = Money::from_decimal(Decimal::new(30015, 4)); // 3.0015
//! assert_eq!(tax.cents(), 300);
//!
//! assert_eq!(format_currency(Decimal::new(5, 1)), "L 0.50");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::CURRENCY_SYMBOL;

/// Rounds to two decimal places, half away from zero.
///
/// `2.345 → 2.35`, `-2.345 → -2.35`, `33.2775 → 33.28`.
///
/// ```rust
/// use factura_core::money::round2;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round2(Decimal::new(2345, 3)), Decimal::new(235, 2));
/// assert_eq!(round2(Decimal::new(-2345, 3)), Decimal::new(-235, 2));
/// ```
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount as Lempiras: `"L 1,234.56"`.
///
/// Comma thousands separator, dot decimal separator, exactly two decimals.
/// The amount is rounded with [`round2`] first.
pub fn format_currency(amount: Decimal) -> String {
    Money::from_decimal(amount).to_string()
}

// =============================================================================
// Money Type
// =============================================================================

/// A rounded monetary value in centavos (1/100 Lempira).
///
/// ## Design Decisions
/// - **i64 (signed)**: a percentage discount above 100% can drive the
///   taxable amount negative, and that has to stay representable
/// - **Built only through round2**: `from_decimal` is the single entry
///   point from arbitrary-precision input
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ```rust
    /// use factura_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // L 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Rounds a decimal amount with [`round2`] and stores it as centavos.
    ///
    /// Amounts beyond the i64 centavo range saturate.
    pub fn from_decimal(amount: Decimal) -> Self {
        let mut rounded = round2(amount);
        rounded.rescale(2);
        let cents = i64::try_from(rounded.mantissa()).unwrap_or(if rounded.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        });
        Money(cents)
    }

    /// Returns the value as an exact two-place decimal.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-Lempira portion (truncated toward zero).
    #[inline]
    pub const fn lempiras(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavo portion (always 0-99).
    #[inline]
    pub const fn centavos_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders `L 1,234.56`; negatives render as `L -1,234.56`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{} {}{}.{:02}",
            CURRENCY_SYMBOL,
            sign,
            group_thousands(self.lempiras().unsigned_abs()),
            self.centavos_part()
        )
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec!(20.010)), dec!(20.01));
        assert_eq!(round2(dec!(3.0015)), dec!(3.00));
        assert_eq!(round2(dec!(33.2775)), dec!(33.28));
        assert_eq!(round2(dec!(0.005)), dec!(0.01));
        assert_eq!(round2(dec!(-0.005)), dec!(-0.01));
        assert_eq!(round2(dec!(2.5)), dec!(2.50));
    }

    #[test]
    fn test_from_decimal() {
        assert_eq!(Money::from_decimal(dec!(20.01)).cents(), 2001);
        assert_eq!(Money::from_decimal(dec!(246.5)).cents(), 24650);
        assert_eq!(Money::from_decimal(dec!(10.005)).cents(), 1001);
        assert_eq!(Money::from_decimal(dec!(7)).cents(), 700);
        assert_eq!(Money::from_decimal(dec!(-1.234)).cents(), -123);
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(Money::from_cents(22185).to_decimal(), dec!(221.85));
        assert_eq!(Money::zero().to_decimal(), dec!(0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(123_456).to_string(), "L 1,234.56");
        assert_eq!(Money::from_cents(500).to_string(), "L 5.00");
        assert_eq!(Money::from_cents(0).to_string(), "L 0.00");
        assert_eq!(Money::from_cents(100_000_000).to_string(), "L 1,000,000.00");
        assert_eq!(Money::from_cents(-550).to_string(), "L -5.50");
        assert_eq!(Money::from_cents(-123_456).to_string(), "L -1,234.56");
    }

    #[test]
    fn test_format_currency_rounds_first() {
        assert_eq!(format_currency(dec!(1234.565)), "L 1,234.57");
        assert_eq!(format_currency(dec!(255.13)), "L 255.13");
        assert_eq!(format_currency(dec!(999.999)), "L 1,000.00");
    }

    #[test]
    fn test_parts() {
        let money = Money::from_cents(1099);
        assert_eq!(money.lempiras(), 10);
        assert_eq!(money.centavos_part(), 99);

        let negative = Money::from_cents(-550);
        assert_eq!(negative.lempiras(), -5);
        assert_eq!(negative.centavos_part(), 50);
        assert!(negative.is_negative());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);

        let total: Money = vec![a, b, Money::from_cents(1)].into_iter().sum();
        assert_eq!(total.cents(), 1501);
    }

    #[test]
    fn test_min_is_ordering_based() {
        let discount = Money::from_cents(5000);
        let subtotal = Money::from_cents(100_000);
        assert_eq!(discount.min(subtotal), discount);
    }
}
