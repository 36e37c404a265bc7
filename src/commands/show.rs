//! Show command implementation.

use crate::config::Config;
use crate::deals::DealSummary;
use crate::filters::FilterChainBuilder;
use crate::format::Formatter;
use crate::report::read_products;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

/// Filters applied when showing a saved product set.
#[derive(Debug, Clone, Default)]
pub struct ShowOptions {
    /// Words that must appear in the name
    pub search: Option<String>,
    /// Words that must not appear in the name
    pub exclude: Vec<String>,
    /// Minimum discount percentage
    pub min_discount: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Only spectacular deals
    pub spectacular: bool,
    /// Print the run summary instead of the product list
    pub summary: bool,
}

/// Prints a previously written product set.
pub struct ShowCommand {
    config: Config,
}

impl ShowCommand {
    /// Creates a new show command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Loads `input` (or the configured output file) and returns formatted output.
    pub fn execute(&self, input: Option<PathBuf>, options: &ShowOptions) -> Result<String> {
        let path = input.unwrap_or_else(|| self.config.output.clone());
        let products = read_products(&path)?;
        info!("Loaded {} products from {}", products.len(), path.display());

        let filters = FilterChainBuilder::new()
            .search(options.search.as_deref())
            .exclude_keywords(options.exclude.clone())
            .min_discount(options.min_discount)
            .price_range(options.min_price, options.max_price)
            .spectacular_only(options.spectacular)
            .build();

        if !filters.is_empty() {
            debug!("Active filters: {}", filters.descriptions().join(", "));
        }

        let products = filters.apply(products);

        let formatter = Formatter::new(self.config.format);
        if options.summary {
            let summary = DealSummary::from_products(&products);
            return Ok(formatter.format_summary(&summary));
        }

        Ok(formatter.format_products(&products))
    }
}
