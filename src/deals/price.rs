//! Price extraction from currency-formatted text.
//!
//! Two strategies are offered. [`scan_prices`] pulls every currency-prefixed
//! amount out of a blob (used when a card renders the sale and struck-through
//! prices together), and [`parse_price`] reads one amount from text that is
//! already isolated to a single price element. Neither fails loudly: the
//! caller decides whether a missing price matters.

use regex_lite::Regex;
use std::sync::LazyLock;

/// Currency symbol, optional spacing, digits with optional thousands groups
/// and an optional two-digit fraction.
static CURRENCY_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[$€£¥]\s*(\d+(?:,\d{3})*(?:\.\d{2})?)").unwrap()
});

/// Scans `text` for currency-prefixed amounts, in the order they appear.
///
/// Returns an empty vector when nothing matches.
pub fn scan_prices(text: &str) -> Vec<f64> {
    CURRENCY_AMOUNT
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|amount| amount.as_str().replace(',', "").parse().ok())
        .collect()
}

/// Parses a single price from text isolated to one price element.
///
/// Every character that is not a digit or a decimal point is dropped. Only the
/// first decimal point is honored; anything from a second point onwards is
/// discarded.
pub fn parse_price(text: &str) -> Option<f64> {
    // Skip punctuation such as "Reg." that precedes the amount
    let start = text.char_indices().find_map(|(i, c)| {
        let starts_fraction =
            c == '.' && text[i + 1..].chars().next().is_some_and(|n| n.is_ascii_digit());
        (c.is_ascii_digit() || starts_fraction).then_some(i)
    })?;

    let cleaned: String =
        text[start..].chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();

    let mut parts = cleaned.split('.');
    let whole = parts.next().unwrap_or_default();
    let whole = if whole.is_empty() { "0" } else { whole };

    let normalized = match parts.next() {
        Some(fraction) if !fraction.is_empty() => format!("{}.{}", whole, fraction),
        _ => whole.to_string(),
    };

    normalized.parse().ok()
}
