//! Minimum discount filter.

use super::Filter;
use crate::deals::Product;

/// Keeps products discounted at least a given percentage.
pub struct DiscountFilter {
    min: f64,
}

impl DiscountFilter {
    /// Creates a filter for a minimum discount percentage.
    pub fn new(min: f64) -> Self {
        Self { min }
    }
}

impl Filter for DiscountFilter {
    fn matches(&self, product: &Product) -> bool {
        product.discount >= self.min
    }

    fn description(&self) -> String {
        format!("Discount: {}%+", self.min)
    }
}
