//! # Authorized Range Membership
//!
//! Decides whether an invoice number falls inside the range the tax
//! authority granted with the CAI.
//!
//! ## Strategy Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  any bound or candidate empty ──────────────────────────► true          │
//! │                                                                         │
//! │  1. segment_strategy      same segment count, same prefix,             │
//! │       │                   numeric correlatives compared inclusively    │
//! │       │ None                                                            │
//! │       ▼                                                                 │
//! │  2. digit_strategy        strip non-digits, compare as integers        │
//! │       │ None                                                            │
//! │       ▼                                                                 │
//! │  3. lexicographic_strategy   start <= current <= end as strings         │
//! │                              (always answers)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each strategy returns `Option<bool>`: `None` means "cannot tell, ask the
//! next one". Later strategies are progressively less precise. The digit
//! strategy will treat `001-1-5` and `0011-5` alike; that loss is accepted.
//!
//! The chain is permissive on purpose: an unconfigured range admits every
//! number, and nothing here ever blocks invoicing on its own.

use serde::{Deserialize, Serialize};

use crate::numbering::{Correlative, InvoiceNumber, SEGMENT_SEPARATOR};

/// The three strings every strategy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeQuery<'a> {
    pub current: &'a str,
    pub start: &'a str,
    pub end: &'a str,
}

/// A single comparison strategy.
pub type RangeStrategy = fn(&RangeQuery<'_>) -> Option<bool>;

/// Strategies in the order they are consulted.
pub const STRATEGIES: [RangeStrategy; 3] =
    [segment_strategy, digit_strategy, lexicographic_strategy];

/// Segment-wise comparison.
///
/// Inconclusive when segment counts differ, when there is no prefix, or
/// when a correlative is not numeric. A prefix mismatch with equal
/// segment counts is a conclusive `false`.
pub fn segment_strategy(query: &RangeQuery<'_>) -> Option<bool> {
    let counts = [query.current, query.start, query.end].map(segment_count);
    if counts[0] < 2 || counts[0] != counts[1] || counts[0] != counts[2] {
        return None;
    }

    let (current_prefix, current_tail) = split_last(query.current)?;
    let (start_prefix, start_tail) = split_last(query.start)?;
    let (end_prefix, end_tail) = split_last(query.end)?;

    if current_prefix != start_prefix || current_prefix != end_prefix {
        return Some(false);
    }

    let current = Correlative::parse(current_tail)?.value();
    let start = Correlative::parse(start_tail)?.value();
    let end = Correlative::parse(end_tail)?.value();

    Some(start <= current && current <= end)
}

/// Digits-only comparison: every non-digit character is dropped and the
/// remainder parsed as an integer. Inconclusive when any operand has no
/// digits or too many to parse.
pub fn digit_strategy(query: &RangeQuery<'_>) -> Option<bool> {
    let current = digits_value(query.current)?;
    let start = digits_value(query.start)?;
    let end = digits_value(query.end)?;

    Some(start <= current && current <= end)
}

/// Plain string ordering. The last resort; always answers.
pub fn lexicographic_strategy(query: &RangeQuery<'_>) -> Option<bool> {
    Some(query.start <= query.current && query.current <= query.end)
}

/// Checks whether `current` may be issued inside `start..=end`.
///
/// Returns `true` when any of the three is empty (no range configured).
///
/// ## Example
/// ```rust
/// use factura_core::range::is_invoice_number_in_range;
///
/// let start = "000-001-01-00000001";
/// let end = "000-001-01-00005000";
///
/// assert!(is_invoice_number_in_range(start, start, end));
/// assert!(is_invoice_number_in_range(end, start, end));
/// assert!(!is_invoice_number_in_range("000-001-01-00005001", start, end));
/// assert!(is_invoice_number_in_range("anything", "", ""));
/// ```
pub fn is_invoice_number_in_range(current: &str, start: &str, end: &str) -> bool {
    let query = RangeQuery {
        current: current.trim(),
        start: start.trim(),
        end: end.trim(),
    };

    if query.current.is_empty() || query.start.is_empty() || query.end.is_empty() {
        return true;
    }

    STRATEGIES
        .iter()
        .find_map(|strategy| strategy(&query))
        .unwrap_or(true)
}

fn segment_count(value: &str) -> usize {
    value.split(SEGMENT_SEPARATOR).count()
}

fn split_last(value: &str) -> Option<(&str, &str)> {
    value.rsplit_once(SEGMENT_SEPARATOR)
}

fn digits_value(value: &str) -> Option<u128> {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

// =============================================================================
// Invoice Range
// =============================================================================

/// The closed interval of invoice numbers authorized with a CAI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRange {
    pub start: String,
    pub end: String,
}

impl InvoiceRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        InvoiceRange {
            start: start.into(),
            end: end.into(),
        }
    }

    /// See [`is_invoice_number_in_range`].
    pub fn contains(&self, current: &str) -> bool {
        is_invoice_number_in_range(current, &self.start, &self.end)
    }

    /// How many numbers can still be issued starting at `next` (inclusive).
    ///
    /// Only answers when `next` and `end` share a prefix and parse as
    /// structured numbers; returns `Some(0)` once `next` is past the end.
    ///
    /// ```rust
    /// use factura_core::range::InvoiceRange;
    ///
    /// let range = InvoiceRange::new("000-001-01-00000001", "000-001-01-00000050");
    /// assert_eq!(range.remaining_from("000-001-01-00000041"), Some(10));
    /// assert_eq!(range.remaining_from("000-001-01-00000051"), Some(0));
    /// ```
    pub fn remaining_from(&self, next: &str) -> Option<u128> {
        let next = InvoiceNumber::parse(next.trim())?;
        let end = InvoiceNumber::parse(self.end.trim())?;
        if next.prefix() != end.prefix() {
            return None;
        }

        let next = next.correlative().value();
        let end = end.correlative().value();
        Some(if next > end { 0 } else { end - next + 1 })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "000-001-01-00000001";
    const END: &str = "000-001-01-00005000";

    fn query<'a>(current: &'a str, start: &'a str, end: &'a str) -> RangeQuery<'a> {
        RangeQuery {
            current,
            start,
            end,
        }
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(is_invoice_number_in_range(START, START, END));
        assert!(is_invoice_number_in_range(END, START, END));
        assert!(is_invoice_number_in_range("000-001-01-00002500", START, END));
    }

    #[test]
    fn test_outside_range() {
        assert!(!is_invoice_number_in_range("000-001-01-00005001", START, END));
        assert!(!is_invoice_number_in_range("000-001-01-00000000", START, END));
    }

    #[test]
    fn test_missing_configuration_permits() {
        assert!(is_invoice_number_in_range("anything", "", ""));
        assert!(is_invoice_number_in_range("000-001-01-99999999", START, ""));
        assert!(is_invoice_number_in_range("000-001-01-99999999", "", END));
        assert!(is_invoice_number_in_range("", START, END));
        assert!(is_invoice_number_in_range("x", "  ", END));
    }

    #[test]
    fn test_segment_strategy_prefix_mismatch_is_conclusive() {
        let q = query("000-002-01-00000010", START, END);
        assert_eq!(segment_strategy(&q), Some(false));
        assert!(!is_invoice_number_in_range(q.current, START, END));
    }

    #[test]
    fn test_segment_strategy_inconclusive_cases() {
        // differing segment counts
        assert_eq!(segment_strategy(&query("001-00000010", START, END)), None);
        // no prefix at all
        assert_eq!(segment_strategy(&query("10", "1", "50")), None);
        // non-numeric correlative
        assert_eq!(
            segment_strategy(&query("000-001-01-0000000A", START, END)),
            None
        );
    }

    #[test]
    fn test_digit_fallback_on_segment_count_mismatch() {
        // digits: 0000010100000100 within 0000010100000001..=0000010100005000
        let q = query("000001-01-00000100", START, END);
        assert_eq!(segment_strategy(&q), None);
        assert_eq!(digit_strategy(&q), Some(true));
        assert!(is_invoice_number_in_range(q.current, START, END));
    }

    #[test]
    fn test_digit_strategy_conflates_prefixes() {
        let q = query("0-0-0-0-0-1-0-1-0-0-0-0-0-0-9-9", START, END);
        assert_eq!(digit_strategy(&q), Some(true));
    }

    #[test]
    fn test_digit_strategy_inconclusive_without_digits() {
        assert_eq!(digit_strategy(&query("ABC", "AAA", "ZZZ")), None);
        let too_long = "9".repeat(60);
        assert_eq!(digit_strategy(&query(&too_long, "1", "2")), None);
    }

    #[test]
    fn test_lexicographic_fallback() {
        assert!(is_invoice_number_in_range("B", "A", "C"));
        assert!(!is_invoice_number_in_range("D", "A", "C"));
        assert_eq!(lexicographic_strategy(&query("A", "A", "A")), Some(true));
    }

    #[test]
    fn test_invoice_range_helpers() {
        let range = InvoiceRange::new(START, END);
        assert!(range.contains("000-001-01-00000042"));
        assert!(!range.contains("000-001-01-00005001"));

        assert!(InvoiceRange::default().contains("whatever"));
    }

    #[test]
    fn test_remaining_from() {
        let range = InvoiceRange::new(START, END);
        assert_eq!(range.remaining_from(START), Some(5000));
        assert_eq!(range.remaining_from(END), Some(1));
        assert_eq!(range.remaining_from("000-001-01-00005001"), Some(0));
        assert_eq!(range.remaining_from("000-002-01-00000001"), None);
        assert_eq!(range.remaining_from("garbage"), None);
    }
}
