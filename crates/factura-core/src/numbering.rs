//! # Invoice Numbering
//!
//! Fiscal invoice numbers are dash-delimited strings whose last segment is
//! a zero-padded correlative:
//!
//! ```text
//!   000 - 001 - 01 - 00000042
//!   └──────┬─────┘   └───┬──┘
//!       prefix       correlative
//!  (establishment,   (width 8, padded)
//!   point of sale,
//!   document type)
//! ```
//!
//! The prefix is carried through untouched. The correlative is handled by
//! [`Correlative`], the single place that knows about padding width and
//! about what happens when `99` becomes `100`.

use std::fmt;

use tracing::warn;

use crate::error::{CoreError, CoreResult};
use crate::MAX_INVOICE_NUMBER_LENGTH;

/// Segment separator inside an invoice number.
pub const SEGMENT_SEPARATOR: char = '-';

// =============================================================================
// Correlative Codec
// =============================================================================

/// A zero-padded decimal segment together with its original width.
///
/// Incrementing keeps the width. When the value outgrows it (`99 → 100`)
/// the rendered segment silently gains a digit, which also changes the
/// total length of the invoice number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correlative {
    value: u128,
    width: usize,
}

impl Correlative {
    /// Parses a segment made only of ASCII digits.
    ///
    /// Returns `None` for empty segments, any non-digit character, or
    /// values that do not fit in a u128.
    ///
    /// ```rust
    /// use factura_core::numbering::Correlative;
    ///
    /// let c = Correlative::parse("00000041").unwrap();
    /// assert_eq!(c.value(), 41);
    /// assert_eq!(c.width(), 8);
    /// assert!(Correlative::parse("12a").is_none());
    /// ```
    pub fn parse(segment: &str) -> Option<Self> {
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value = segment.parse::<u128>().ok()?;
        Some(Correlative {
            value,
            width: segment.len(),
        })
    }

    /// The numeric value.
    #[inline]
    pub const fn value(&self) -> u128 {
        self.value
    }

    /// The padding width the segment was parsed with.
    #[inline]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// The next correlative, same width. `None` only on u128 overflow.
    pub fn succ(&self) -> Option<Self> {
        Some(Correlative {
            value: self.value.checked_add(1)?,
            width: self.width,
        })
    }

    /// True when rendering would need more digits than the original width.
    pub fn overflows_width(&self) -> bool {
        self.render().len() > self.width
    }

    /// Renders left-padded with zeros to the original width.
    pub fn render(&self) -> String {
        format!("{:0width$}", self.value, width = self.width)
    }
}

impl fmt::Display for Correlative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// =============================================================================
// Structured Invoice Number
// =============================================================================

/// An invoice number split into prefix segments and a correlative.
///
/// Only numbers with at least two segments and a numeric last segment
/// parse; the bare-integer form handled by [`increment_invoice_number`]
/// has no prefix and is not represented here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceNumber {
    prefix: Vec<String>,
    correlative: Correlative,
}

impl InvoiceNumber {
    /// Parses `"000-001-01-00000001"` style numbers.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut segments: Vec<&str> = raw.split(SEGMENT_SEPARATOR).collect();
        if segments.len() < 2 {
            return None;
        }
        let last = segments.pop()?;
        let correlative = Correlative::parse(last)?;
        Some(InvoiceNumber {
            prefix: segments.into_iter().map(str::to_string).collect(),
            correlative,
        })
    }

    /// Prefix segments joined with `-` (`"000-001-01"`).
    pub fn prefix(&self) -> String {
        self.prefix.join("-")
    }

    /// Number of segments including the correlative.
    pub fn segment_count(&self) -> usize {
        self.prefix.len() + 1
    }

    pub fn correlative(&self) -> Correlative {
        self.correlative
    }

    /// The number immediately following this one.
    pub fn succ(&self) -> Option<Self> {
        Some(InvoiceNumber {
            prefix: self.prefix.clone(),
            correlative: self.correlative.succ()?,
        })
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.prefix {
            write!(f, "{}{}", segment, SEGMENT_SEPARATOR)?;
        }
        write!(f, "{}", self.correlative)
    }
}

// =============================================================================
// Increment
// =============================================================================

/// Returns the invoice number that follows `current` in its sequence.
///
/// ## Rules
/// - No dash: the whole string is the counter; it is incremented and
///   re-padded to the original string length
/// - Dashes: the last segment is incremented and re-padded to its own
///   width; every preceding segment is kept verbatim
/// - Anything that cannot be read (empty input, non-digit counter)
///   comes back unchanged and a warning is logged
///
/// Callers compare the result with the input: equal means no increment
/// happened and nothing should be persisted.
///
/// ## Example
/// ```rust
/// use factura_core::numbering::increment_invoice_number;
///
/// assert_eq!(increment_invoice_number("000-001-01-00000001"), "000-001-01-00000002");
/// assert_eq!(increment_invoice_number("01-99"), "01-100");
/// assert_eq!(increment_invoice_number("0009"), "0010");
/// assert_eq!(increment_invoice_number("FAC-ABC"), "FAC-ABC");
/// ```
pub fn increment_invoice_number(current: &str) -> String {
    match try_increment(current) {
        Some(next) => next,
        None => {
            warn!(invoice_number = %current, "Invoice number could not be incremented; leaving it unchanged");
            current.to_string()
        }
    }
}

/// Strict form of [`increment_invoice_number`] for callers that persist
/// the result and must never write the same number back.
///
/// ```rust
/// use factura_core::numbering::checked_increment;
///
/// assert_eq!(checked_increment("001-001-01-00000009").unwrap(), "001-001-01-00000010");
/// assert!(checked_increment("FAC-ABC").is_err());
/// ```
pub fn checked_increment(current: &str) -> CoreResult<String> {
    try_increment(current).ok_or_else(|| CoreError::NotIncrementable(current.to_string()))
}

fn try_increment(current: &str) -> Option<String> {
    if current.is_empty() {
        return None;
    }

    if !current.contains(SEGMENT_SEPARATOR) {
        return Correlative::parse(current)?.succ().map(|c| c.render());
    }

    InvoiceNumber::parse(current)?.succ().map(|n| n.to_string())
}

// =============================================================================
// Format Validation
// =============================================================================

/// Permissive format check for user-entered invoice numbers.
///
/// Accepts a trimmed, non-empty string of at most 50 characters made of
/// digits and dashes, or of ASCII letters, digits and dashes. Strict
/// fiscal-format enforcement is left to the tax authority.
///
/// ```rust
/// use factura_core::numbering::is_valid_invoice_number_format;
///
/// assert!(is_valid_invoice_number_format("000-001-01-00000001"));
/// assert!(is_valid_invoice_number_format("ABC-001-00000001"));
/// assert!(!is_valid_invoice_number_format(""));
/// assert!(!is_valid_invoice_number_format("001/002"));
/// ```
pub fn is_valid_invoice_number_format(number: &str) -> bool {
    let number = number.trim();
    if number.is_empty() || number.chars().count() > MAX_INVOICE_NUMBER_LENGTH {
        return false;
    }

    is_canonical_format(number)
        || number.chars().all(|c| c.is_ascii_digit() || c == SEGMENT_SEPARATOR)
        || number
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == SEGMENT_SEPARATOR)
}

/// The SAR layout `\d{3}-\d{3}-\d{2}-\d{8}`. Informational only.
pub fn is_canonical_format(number: &str) -> bool {
    const WIDTHS: [usize; 4] = [3, 3, 2, 8];

    let segments: Vec<&str> = number.split(SEGMENT_SEPARATOR).collect();
    segments.len() == WIDTHS.len()
        && segments
            .iter()
            .zip(WIDTHS)
            .all(|(s, w)| s.len() == w && s.bytes().all(|b| b.is_ascii_digit()))
}

// =============================================================================
// Unit Tests
// =============================================================================
