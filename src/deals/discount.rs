//! Discount percentage and spectacular-deal classification.

/// Discount percentage at or above which a product is a spectacular deal.
pub const SPECTACULAR_THRESHOLD: f64 = 60.0;

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Returns the discount percentage of `current` relative to `original`.
///
/// Zero when there is no original price or it does not exceed the current one.
pub fn discount(current: f64, original: Option<f64>) -> f64 {
    match original {
        Some(original) if original > current => round2((original - current) / original * 100.0),
        _ => 0.0,
    }
}

/// Returns true if `discount` meets `threshold` (inclusive).
pub fn is_spectacular(discount: f64, threshold: f64) -> bool {
    discount >= threshold
}

/// A validated (current, original) price pair with its discount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    /// Price a buyer pays now
    pub current: f64,
    /// Reference price before discount, never below `current`
    pub original: Option<f64>,
    /// Discount percentage, two decimals
    pub discount: f64,
    /// True if the parsed original was below the current price and got clamped
    pub clamped: bool,
}

impl Pricing {
    /// Builds a pricing, clamping an original below `current` to `current`.
    pub fn new(current: f64, original: Option<f64>) -> Self {
        let clamped = original.is_some_and(|original| original < current);
        let original = original.map(|original| original.max(current));

        Self { current, original, discount: discount(current, original), clamped }
    }
}
