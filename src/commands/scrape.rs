//! Scrape command implementation.

use crate::config::{Config, OutputFormat};
use crate::deals::ExtractionSession;
use crate::format::Formatter;
#[cfg(feature = "browser")]
use crate::render::BrowserRenderer;
use crate::render::{HttpRenderer, PageRenderer, RendererKind};
use crate::report::DealReporter;
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Extracts the listing page, persists the products and sends alerts.
pub struct ScrapeCommand {
    config: Config,
}

impl ScrapeCommand {
    /// Creates a new scrape command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes the scrape and returns formatted output.
    pub async fn execute(&self) -> Result<String> {
        let reporter = DealReporter::from_config(&self.config)?;

        match RendererKind::for_config(&self.config) {
            #[cfg(feature = "browser")]
            RendererKind::Browser => {
                let mut renderer = BrowserRenderer::launch(&self.config)
                    .await
                    .context("Failed to start browser renderer")?;
                self.execute_with(&mut renderer, &reporter).await
            }
            _ => {
                let mut renderer =
                    HttpRenderer::new(&self.config).context("Failed to start page renderer")?;
                self.execute_with(&mut renderer, &reporter).await
            }
        }
    }

    /// Executes the scrape with a provided renderer and reporter (for testing).
    pub async fn execute_with<R: PageRenderer>(
        &self,
        renderer: &mut R,
        reporter: &DealReporter,
    ) -> Result<String> {
        let session = match ExtractionSession::new(&self.config) {
            Ok(session) => session,
            Err(e) => {
                if let Err(close) = renderer.close().await {
                    warn!("Failed to close renderer: {}", close);
                }
                return Err(e);
            }
        };
        let outcome = session.run(renderer).await;

        if let Some(reason) = &outcome.aborted {
            anyhow::bail!("Extraction aborted: {}", reason);
        }

        if outcome.stats.price_anomalies > 0 {
            info!(
                "{} products had an original price below the current price",
                outcome.stats.price_anomalies
            );
        }

        let report = reporter.report(&outcome.products).await?;

        let formatter = Formatter::new(self.config.format);
        if !report.written {
            return Ok(formatter.format_products(&[]));
        }

        let mut output = formatter.format_summary(&report.summary);

        if matches!(self.config.format, OutputFormat::Table | OutputFormat::Markdown) {
            output.push_str(&format!("\n\nSaved to {}", reporter.output().display()));
            if report.alerts.sent + report.alerts.failed > 0 {
                output.push_str(&format!(
                    "\nAlerts sent: {} ({} failed)",
                    report.alerts.sent, report.alerts.failed
                ));
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderError;
    use crate::report::{read_products, write_products};
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Mock renderer serving fixed markup.
    struct MockRenderer {
        markup: String,
        fail: bool,
        closed: bool,
    }

    impl MockRenderer {
        fn new(markup: &str) -> Self {
            Self { markup: markup.to_string(), fail: false, closed: false }
        }
    }

    #[async_trait]
    impl PageRenderer for MockRenderer {
        async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError> {
            if self.fail {
                return Err(RenderError::Timeout {
                    what: format!("navigation to {}", url),
                    waited: timeout,
                });
            }
            Ok(())
        }

        async fn wait_for_network_idle(&mut self, _timeout: Duration) -> Result<(), RenderError> {
            Ok(())
        }

        async fn dismiss_cookie_banner(&mut self, _timeout: Duration) {}

        async fn scroll_to_bottom(&mut self) -> Result<(), RenderError> {
            Ok(())
        }

        async fn wait_for_selector(
            &mut self,
            _selector: &str,
            _timeout: Duration,
        ) -> Result<(), RenderError> {
            Ok(())
        }

        async fn content(&mut self) -> Result<String, RenderError> {
            Ok(self.markup.clone())
        }

        async fn close(&mut self) -> Result<(), RenderError> {
            self.closed = true;
            Ok(())
        }
    }

    fn make_test_config(dir: &TempDir) -> Config {
        Config { output: dir.path().join("products.json"), ..Config::default() }
    }

    fn make_listing_html(products: &[(&str, &str)]) -> String {
        let mut html = String::from("<html><body><div class=\"grid\">");
        for (name, price) in products {
            html.push_str(&format!(
                r#"<div class="product-item">
                    <a href="/us/{}"><h2>{}</h2></a>
                    <div class="price">{}</div>
                </div>"#,
                name.to_lowercase().replace(' ', "-"),
                name,
                price
            ));
        }
        html.push_str("</div></body></html>");
        html
    }

    #[tokio::test]
    async fn test_scrape_command_basic() {
        let dir = TempDir::new().unwrap();
        let config = make_test_config(&dir);
        let reporter = DealReporter::new(&config.output);
        let mut renderer = MockRenderer::new(&make_listing_html(&[
            ("Zen AiO 24", "$399.99 $999.99"),
            ("Vivo AiO 27", "$749.00"),
        ]));

        let cmd = ScrapeCommand::new(config.clone());
        let output = cmd.execute_with(&mut renderer, &reporter).await.unwrap();

        assert!(output.contains("Products:          2"));
        assert!(output.contains("Spectacular deals: 1"));
        assert!(output.contains("Saved to"));
        assert!(renderer.closed);

        let saved = read_products(&config.output).unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].name, "Zen AiO 24");
        assert_eq!(saved[0].url, "https://shop.asus.com/us/zen-aio-24");
        assert_eq!(saved[1].original_price, None);
    }

    #[tokio::test]
    async fn test_scrape_command_json_summary() {
        let dir = TempDir::new().unwrap();
        let mut config = make_test_config(&dir);
        config.format = OutputFormat::Json;
        let reporter = DealReporter::new(&config.output);
        let mut renderer = MockRenderer::new(&make_listing_html(&[("A", "$40.00 $100.00")]));

        let output =
            ScrapeCommand::new(config).execute_with(&mut renderer, &reporter).await.unwrap();
        let summary: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(summary["total"], 1);
        assert_eq!(summary["spectacular"], 1);
    }

    #[tokio::test]
    async fn test_scrape_command_empty_keeps_previous_output() {
        let dir = TempDir::new().unwrap();
        let config = make_test_config(&dir);
        write_products(&config.output, &[]).unwrap();
        let before = std::fs::read_to_string(&config.output).unwrap();

        let reporter = DealReporter::new(&config.output);
        let mut renderer =
            MockRenderer::new(r#"<html><body><div class="product-item"></div></body></html>"#);

        let output = ScrapeCommand::new(config.clone())
            .execute_with(&mut renderer, &reporter)
            .await
            .unwrap();

        assert!(output.contains("No products found"));
        assert_eq!(std::fs::read_to_string(&config.output).unwrap(), before);
    }

    #[tokio::test]
    async fn test_scrape_command_abort_is_error() {
        let dir = TempDir::new().unwrap();
        let config = make_test_config(&dir);
        let reporter = DealReporter::new(&config.output);
        let mut renderer = MockRenderer::new("");
        renderer.fail = true;

        let err = ScrapeCommand::new(config.clone())
            .execute_with(&mut renderer, &reporter)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Extraction aborted"));
        assert!(!config.output.exists());
    }

    #[tokio::test]
    async fn test_scrape_command_rejects_threshold() {
        let dir = TempDir::new().unwrap();
        let mut config = make_test_config(&dir);
        config.spectacular_threshold = f64::NAN;
        let reporter = DealReporter::new(&config.output);
        let mut renderer = MockRenderer::new(&make_listing_html(&[("A", "$40.00 $100.00")]));

        let err = ScrapeCommand::new(config.clone())
            .execute_with(&mut renderer, &reporter)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("between 0 and 100"));
        assert!(renderer.closed);
        assert!(!config.output.exists());
    }

    #[tokio::test]
    async fn test_scrape_command_invalid_selector() {
        let dir = TempDir::new().unwrap();
        let mut config = make_test_config(&dir);
        config.selectors.name = vec!["h2[".to_string()];
        let reporter = DealReporter::new(&config.output);
        let mut renderer = MockRenderer::new("");

        let err = ScrapeCommand::new(config)
            .execute_with(&mut renderer, &reporter)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid name selector"));
    }
}
