//! Spectacular-deal filter.

use super::Filter;
use crate::deals::Product;

/// Keeps only products flagged as spectacular deals.
pub struct SpectacularFilter;

impl SpectacularFilter {
    /// Creates a new spectacular filter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for SpectacularFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for SpectacularFilter {
    fn matches(&self, product: &Product) -> bool {
        product.is_spectacular_deal
    }

    fn description(&self) -> String {
        "Spectacular deals only".to_string()
    }
}
