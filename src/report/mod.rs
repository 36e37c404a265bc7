//! Persistence of extracted products and alerting on spectacular deals.

pub mod notify;

use crate::config::Config;
use crate::deals::models::{DealSummary, Product};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

pub use notify::{NotificationSink, TelegramNotifier};

/// Alert delivery counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertStats {
    pub sent: usize,
    pub failed: usize,
}

/// What a reporting pass did.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub summary: DealSummary,
    /// False when there was nothing to write
    pub written: bool,
    pub alerts: AlertStats,
}

/// Writes the product set atomically, replacing any previous file.
pub fn write_products(path: &Path, products: &[Product]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let json = serde_json::to_string_pretty(products).context("Failed to serialize products")?;

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(json.as_bytes())
        .and_then(|_| file.write_all(b"\n"))
        .context("Failed to write products")?;
    file.persist(path).with_context(|| format!("Failed to replace {}", path.display()))?;

    debug!("Wrote {} products to {}", products.len(), path.display());
    Ok(())
}

/// Loads a product set written by [`write_products`].
pub fn read_products(path: &Path) -> Result<Vec<Product>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read products file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse products file: {}", path.display()))
}

/// Builds the alert message for one product.
///
/// Amounts are printed without a currency symbol since the listing may be
/// priced in any currency.
pub fn format_alert(product: &Product) -> String {
    let mut lines = vec![
        "🔥 SPECTACULAR DEAL DETECTED 🔥".to_string(),
        String::new(),
        format!("📦 {}", product.name),
        format!("💰 Price: {:.2}", product.current_price),
    ];

    if let Some(original) = product.original_price {
        lines.push(format!("🏷️ Was: {:.2}", original));
    }

    lines.push(format!("📉 Discount: {}%", product.discount));
    lines.push(format!("🔗 {}", product.url));
    lines.join("\n")
}

/// Persists products and dispatches alerts for the spectacular ones.
pub struct DealReporter {
    output: PathBuf,
    sink: Option<Box<dyn NotificationSink>>,
}

impl DealReporter {
    /// Creates a reporter writing to `output` with alerts disabled.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self { output: output.into(), sink: None }
    }

    /// Enables alerts through `sink`.
    pub fn with_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Creates a reporter from configuration, enabling Telegram when configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let reporter = Self::new(&config.output);

        match TelegramNotifier::from_config(config)? {
            Some(notifier) => Ok(reporter.with_sink(Box::new(notifier))),
            None => {
                debug!("Telegram not configured, alerts disabled");
                Ok(reporter)
            }
        }
    }

    /// Returns the output path.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Writes the products, then alerts on spectacular deals.
    ///
    /// An empty set leaves any previous output untouched. Alert failures are
    /// logged and counted but never fail the report.
    pub async fn report(&self, products: &[Product]) -> Result<Report> {
        let summary = DealSummary::from_products(products);

        if summary.is_empty() {
            warn!("No products found, keeping {} as is", self.output.display());
            return Ok(Report { summary, written: false, alerts: AlertStats::default() });
        }

        write_products(&self.output, products)?;
        info!("Saved {} products to {}", products.len(), self.output.display());

        let alerts = self.dispatch_alerts(products).await;

        Ok(Report { summary, written: true, alerts })
    }

    async fn dispatch_alerts(&self, products: &[Product]) -> AlertStats {
        let mut stats = AlertStats::default();

        let Some(sink) = &self.sink else {
            return stats;
        };

        for product in products.iter().filter(|p| p.is_spectacular_deal) {
            match sink.send(&format_alert(product)).await {
                Ok(()) => {
                    info!("Alert sent for {}", product.name);
                    stats.sent += 1;
                }
                Err(e) => {
                    warn!("Failed to send alert for {}: {:#}", product.name, e);
                    stats.failed += 1;
                }
            }
        }

        stats
    }
}
