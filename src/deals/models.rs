//! Data models for extracted products and run summaries.

use crate::deals::discount::{is_spectacular, round2, Pricing};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product extracted from one listing card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Identifier generated at extraction time, unique within one run
    pub id: Uuid,
    /// Product name, line breaks collapsed
    pub name: String,
    /// Absolute product URL
    pub url: String,
    /// Price a buyer pays now
    pub current_price: f64,
    /// Reference price before discount
    pub original_price: Option<f64>,
    /// Discount percentage, two decimals
    pub discount: f64,
    /// Whether the discount meets the spectacular threshold
    pub is_spectacular_deal: bool,
    /// Extraction timestamp
    pub last_updated: DateTime<Utc>,
    /// Price samples, oldest first
    pub price_history: Vec<PriceSample>,
}

impl Product {
    /// Creates a freshly extracted product with a single price sample.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        pricing: Pricing,
        threshold: f64,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            url: url.into(),
            current_price: pricing.current,
            original_price: pricing.original,
            discount: pricing.discount,
            is_spectacular_deal: is_spectacular(pricing.discount, threshold),
            last_updated: now,
            price_history: vec![PriceSample { price: pricing.current, date: now }],
        }
    }

    /// Returns the amount saved against the original price, if any.
    pub fn savings(&self) -> Option<f64> {
        self.original_price
            .filter(|original| *original > self.current_price)
            .map(|original| round2(original - self.current_price))
    }
}

/// One observed price at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub price: f64,
    pub date: DateTime<Utc>,
}

/// Aggregate figures for a set of products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealSummary {
    /// Number of products
    pub total: usize,
    /// Number of spectacular deals
    pub spectacular: usize,
    /// Mean discount percentage, 0 for an empty set
    pub average_discount: f64,
}

impl DealSummary {
    /// Summarizes a product set.
    pub fn from_products(products: &[Product]) -> Self {
        let total = products.len();
        let spectacular = products.iter().filter(|p| p.is_spectacular_deal).count();

        let average_discount = if total == 0 {
            0.0
        } else {
            round2(products.iter().map(|p| p.discount).sum::<f64>() / total as f64)
        };

        Self { total, spectacular, average_discount }
    }

    /// Returns true if the set held no products.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
