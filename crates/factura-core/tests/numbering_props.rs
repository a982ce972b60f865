//! Property tests for invoice numbering and range membership.

use factura_core::numbering::{increment_invoice_number, Correlative};
use factura_core::range::is_invoice_number_in_range;
use proptest::prelude::*;

/// Establishment, point of sale and document type segments.
fn arb_prefix() -> impl Strategy<Value = String> {
    (0u32..1000, 0u32..1000, 0u32..100).prop_map(|(e, p, d)| format!("{e:03}-{p:03}-{d:02}"))
}

fn arb_width() -> impl Strategy<Value = usize> {
    1usize..=12
}

proptest! {
    #[test]
    fn increment_keeps_prefix_and_width(prefix in arb_prefix(), width in arb_width(), seed in any::<u64>()) {
        let max = 10u128.pow(width as u32) - 1;
        // stay below the all-nines value so the width cannot grow
        let value = u128::from(seed) % max;
        let current = format!("{prefix}-{value:0width$}");

        let next = increment_invoice_number(&current);
        let (next_prefix, next_tail) = next.rsplit_once('-').unwrap();

        prop_assert_eq!(next_prefix, prefix.as_str());
        prop_assert_eq!(next_tail.len(), width);
        prop_assert_eq!(Correlative::parse(next_tail).unwrap().value(), value + 1);
    }

    #[test]
    fn all_nines_grow_by_exactly_one_digit(prefix in arb_prefix(), width in arb_width()) {
        let current = format!("{prefix}-{}", "9".repeat(width));
        let next = increment_invoice_number(&current);
        let expected = format!("{prefix}-1{}", "0".repeat(width));
        prop_assert_eq!(next, expected);
    }

    #[test]
    fn range_bounds_are_inclusive(prefix in arb_prefix(), a in 0u32..100_000_000, b in 0u32..100_000_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let start = format!("{prefix}-{lo:08}");
        let end = format!("{prefix}-{hi:08}");

        prop_assert!(is_invoice_number_in_range(&start, &start, &end));
        prop_assert!(is_invoice_number_in_range(&end, &start, &end));
    }

    #[test]
    fn increment_walks_to_end_of_range(prefix in arb_prefix(), lo in 0u32..1_000_000, span in 0u32..20) {
        let start = format!("{prefix}-{lo:08}");
        let end = format!("{prefix}-{:08}", lo + span);

        let mut current = start.clone();
        for _ in 0..=span {
            prop_assert!(is_invoice_number_in_range(&current, &start, &end));
            current = increment_invoice_number(&current);
        }
        prop_assert!(!is_invoice_number_in_range(&current, &start, &end));
    }

    #[test]
    fn missing_range_admits_everything(current in "\\PC{0,60}") {
        prop_assert!(is_invoice_number_in_range(&current, "", ""));
    }

    #[test]
    fn increment_never_panics(input in "\\PC{0,60}") {
        let _ = increment_invoice_number(&input);
    }
}
