//! # Validation Module
//!
//! Strict checks for data entered in profile settings and the invoice form.
//!
//! ## Where Strictness Lives
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Configuration time (THIS MODULE)      Issue time (engine)              │
//! │  ───────────────────────────────       ─────────────────────────────    │
//! │  RTN must be 14 digits                 range check defaults to allow    │
//! │  CAI must be XXXXXX-...-XX hex         CAI date unreadable → valid      │
//! │  range bounds must be ordered          increment failure → unchanged    │
//! │  percentage must be 0-100              percentage not clamped           │
//! │                                                                         │
//! │  Reject early, with a message.         Never block on ambiguity.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{ValidationError, ValidationResult};
use crate::numbering::is_valid_invoice_number_format;
use crate::totals::Discount;
use crate::types::{FiscalProfile, NewInvoice, TaxRate};

/// Digits in a Honduran RTN.
pub const RTN_DIGITS: usize = 14;

/// Group widths of a CAI code.
pub const CAI_GROUP_WIDTHS: [usize; 6] = [6, 6, 6, 6, 6, 2];

/// Longest business or customer name accepted.
pub const MAX_NAME_LENGTH: usize = 200;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an RTN (Registro Tributario Nacional).
///
/// Dashes and spaces are ignored; exactly 14 digits must remain.
///
/// ```rust
/// use factura_core::validation::validate_rtn;
///
/// assert!(validate_rtn("08011990123456").is_ok());
/// assert!(validate_rtn("0801-1990-123456").is_ok());
/// assert!(validate_rtn("0801199012345").is_err());
/// assert!(validate_rtn("").is_err());
/// ```
pub fn validate_rtn(rtn: &str) -> ValidationResult<()> {
    let rtn = rtn.trim();
    if rtn.is_empty() {
        return Err(ValidationError::required("rtn"));
    }

    let compact: String = rtn.chars().filter(|c| *c != '-' && *c != ' ').collect();
    if compact.len() != RTN_DIGITS || !compact.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::invalid_format("rtn", "must contain exactly 14 digits"));
    }

    Ok(())
}

/// Validates a CAI code: six dash-separated hexadecimal groups of widths
/// 6-6-6-6-6-2, case-insensitive.
///
/// ```rust
/// use factura_core::validation::validate_cai;
///
/// assert!(validate_cai("35A9E6-F1B2C3-4D5E6F-A1B2C3-D4E5F6-7A").is_ok());
/// assert!(validate_cai("35A9E6-F1B2C3").is_err());
/// ```
pub fn validate_cai(cai: &str) -> ValidationResult<()> {
    let cai = cai.trim();
    if cai.is_empty() {
        return Err(ValidationError::required("cai"));
    }

    let groups: Vec<&str> = cai.split('-').collect();
    let well_formed = groups.len() == CAI_GROUP_WIDTHS.len()
        && groups
            .iter()
            .zip(CAI_GROUP_WIDTHS)
            .all(|(g, w)| g.len() == w && g.bytes().all(|b| b.is_ascii_hexdigit()));

    if !well_formed {
        return Err(ValidationError::invalid_format(
            "cai",
            "must look like XXXXXX-XXXXXX-XXXXXX-XXXXXX-XXXXXX-XX (hexadecimal)",
        ));
    }

    Ok(())
}

/// Validates a user-entered invoice number with the permissive format rule.
pub fn validate_invoice_number(field: &str, number: &str) -> ValidationResult<()> {
    if number.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    if !is_valid_invoice_number_format(number) {
        return Err(ValidationError::invalid_format(
            field,
            "use up to 50 letters, digits and dashes",
        ));
    }
    Ok(())
}

/// Validates a strict `YYYY-MM-DD` date and returns it.
pub fn validate_iso_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationError::invalid_format(field, "must be a date as YYYY-MM-DD"))
}

fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::required(field));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Quantity must be at least 1.
pub fn validate_quantity(qty: u32) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Unit price must be zero or more.
pub fn validate_unit_price(price: Decimal) -> ValidationResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::OutOfRange {
            field: "unit price".to_string(),
            min: "0".to_string(),
            max: "unbounded".to_string(),
        });
    }
    Ok(())
}

/// Percentage must be within 0-100.
///
/// The totals engine does not enforce this; the form must.
pub fn validate_discount_percentage(pct: Decimal) -> ValidationResult<()> {
    if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "discount percentage".to_string(),
            min: "0".to_string(),
            max: "100".to_string(),
        });
    }
    Ok(())
}

/// Validates whichever discount mode is active.
pub fn validate_discount(discount: &Discount) -> ValidationResult<()> {
    match *discount {
        Discount::None => Ok(()),
        Discount::Percentage(pct) => validate_discount_percentage(pct),
        Discount::Amount(amount) if amount < Decimal::ZERO => Err(ValidationError::OutOfRange {
            field: "discount amount".to_string(),
            min: "0".to_string(),
            max: "subtotal".to_string(),
        }),
        Discount::Amount(_) => Ok(()),
    }
}

/// Tax rate must be a fraction within 0-1.
pub fn validate_tax_rate(rate: TaxRate) -> ValidationResult<()> {
    if rate.fraction() < Decimal::ZERO || rate.fraction() > Decimal::ONE {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: "0".to_string(),
            max: "1".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Validates the fiscal profile before it is saved.
///
/// ## Rules
/// - business name, RTN, CAI and CAI expiration date are well formed
/// - range bounds and next number pass the invoice number format check
/// - the range is ordered and the next number lies inside it
pub fn validate_fiscal_profile(profile: &FiscalProfile) -> ValidationResult<()> {
    validate_name("business_name", &profile.business_name)?;
    validate_rtn(&profile.rtn)?;
    validate_cai(&profile.cai)?;
    validate_iso_date("cai_expiration_date", &profile.cai_expiration_date)?;
    validate_invoice_number("invoice_range_start", &profile.invoice_range_start)?;
    validate_invoice_number("invoice_range_end", &profile.invoice_range_end)?;
    validate_invoice_number("next_invoice_number", &profile.next_invoice_number)?;
    validate_tax_rate(profile.tax_rate)?;

    let range = profile.range();
    if !range.contains(&profile.invoice_range_start) {
        return Err(ValidationError::invalid_format(
            "invoice_range_end",
            "must not come before the range start",
        ));
    }
    if !range.contains(&profile.next_invoice_number) {
        return Err(ValidationError::invalid_format(
            "next_invoice_number",
            "must lie inside the authorized range",
        ));
    }

    Ok(())
}

/// Validates invoice form input before totals are computed.
pub fn validate_new_invoice(draft: &NewInvoice) -> ValidationResult<()> {
    validate_name("customer_name", &draft.customer_name)?;

    if let Some(rtn) = draft.customer_rtn.as_deref() {
        if !rtn.trim().is_empty() {
            validate_rtn(rtn)?;
        }
    }

    if draft.items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }
    for item in &draft.items {
        if item.description.trim().is_empty() {
            return Err(ValidationError::required("item description"));
        }
        validate_quantity(item.quantity)?;
        validate_unit_price(item.unit_price)?;
    }

    validate_discount(&draft.discount)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewInvoiceItem;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn profile() -> FiscalProfile {
        let now = Utc::now();
        FiscalProfile {
            id: "p1".to_string(),
            business_name: "Pulpería La Esperanza".to_string(),
            rtn: "08011990123456".to_string(),
            cai: "35A9E6-F1B2C3-4D5E6F-A1B2C3-D4E5F6-7A".to_string(),
            cai_expiration_date: "2026-12-31".to_string(),
            invoice_range_start: "000-001-01-00000001".to_string(),
            invoice_range_end: "000-001-01-00005000".to_string(),
            next_invoice_number: "000-001-01-00000001".to_string(),
            tax_rate: TaxRate::isv(),
            created_at: now,
            updated_at: now,
        }
    }

    fn draft() -> NewInvoice {
        NewInvoice {
            customer_name: "Cliente".to_string(),
            customer_rtn: None,
            issue_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            items: vec![NewInvoiceItem {
                description: "Servicio".to_string(),
                quantity: 1,
                unit_price: dec!(100),
            }],
            discount: Discount::None,
            notes: None,
        }
    }

    #[test]
    fn test_validate_rtn() {
        assert!(validate_rtn("08011990123456").is_ok());
        assert!(validate_rtn(" 0801 1990 123456 ").is_ok());
        assert!(validate_rtn("").is_err());
        assert!(validate_rtn("0801199012345A").is_err());
        assert!(validate_rtn("080119901234567").is_err());
    }

    #[test]
    fn test_validate_cai() {
        assert!(validate_cai("35a9e6-f1b2c3-4d5e6f-a1b2c3-d4e5f6-7a").is_ok());
        assert!(validate_cai("").is_err());
        assert!(validate_cai("35A9E6-F1B2C3-4D5E6F-A1B2C3-D4E5F6-7AB").is_err());
        assert!(validate_cai("35A9EG-F1B2C3-4D5E6F-A1B2C3-D4E5F6-7A").is_err());
    }

    #[test]
    fn test_validate_iso_date() {
        assert_eq!(
            validate_iso_date("d", "2026-12-31").unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()
        );
        assert!(validate_iso_date("d", "31/12/2026").is_err());
        assert!(validate_iso_date("d", "").is_err());
    }

    #[test]
    fn test_numeric_validators() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());

        assert!(validate_unit_price(dec!(0)).is_ok());
        assert!(validate_unit_price(dec!(10.005)).is_ok());
        assert!(validate_unit_price(dec!(-0.01)).is_err());

        assert!(validate_discount_percentage(dec!(0)).is_ok());
        assert!(validate_discount_percentage(dec!(100)).is_ok());
        assert!(validate_discount_percentage(dec!(150)).is_err());
        assert!(validate_discount_percentage(dec!(-1)).is_err());

        assert!(validate_tax_rate(TaxRate::isv()).is_ok());
        assert!(validate_tax_rate(TaxRate::from_fraction(dec!(1.5))).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(&Discount::None).is_ok());
        assert!(validate_discount(&Discount::Amount(dec!(10))).is_ok());
        assert!(validate_discount(&Discount::Amount(dec!(-10))).is_err());
        assert!(validate_discount(&Discount::Percentage(dec!(101))).is_err());
    }

    #[test]
    fn test_validate_fiscal_profile() {
        assert!(validate_fiscal_profile(&profile()).is_ok());

        let mut reversed = profile();
        reversed.invoice_range_start = "000-001-01-00005000".to_string();
        reversed.invoice_range_end = "000-001-01-00000001".to_string();
        assert!(validate_fiscal_profile(&reversed).is_err());

        let mut outside = profile();
        outside.next_invoice_number = "000-001-01-00005001".to_string();
        assert!(validate_fiscal_profile(&outside).is_err());

        let mut bad_cai = profile();
        bad_cai.cai = "nope".to_string();
        assert!(validate_fiscal_profile(&bad_cai).is_err());

        let mut bad_date = profile();
        bad_date.cai_expiration_date = "not-a-date".to_string();
        assert!(validate_fiscal_profile(&bad_date).is_err());
    }

    #[test]
    fn test_validate_new_invoice() {
        assert!(validate_new_invoice(&draft()).is_ok());

        let mut no_items = draft();
        no_items.items.clear();
        assert!(matches!(
            validate_new_invoice(&no_items),
            Err(ValidationError::Empty { .. })
        ));

        let mut bad_rtn = draft();
        bad_rtn.customer_rtn = Some("123".to_string());
        assert!(validate_new_invoice(&bad_rtn).is_err());

        let mut blank_rtn = draft();
        blank_rtn.customer_rtn = Some("  ".to_string());
        assert!(validate_new_invoice(&blank_rtn).is_ok());

        let mut zero_qty = draft();
        zero_qty.items[0].quantity = 0;
        assert!(validate_new_invoice(&zero_qty).is_err());
    }
}
