//! Static page renderer over HTTP using wreq for TLS fingerprint emulation.
//!
//! The listing markup is fetched once per navigation. There is no script
//! engine behind it, so waits complete immediately: a selector that is not in
//! the fetched markup will never appear and is reported as a timeout at once.
//! This is the renderer of builds without the `browser` feature.

use super::{PageRenderer, RenderError};
use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info};
use wreq::Client;
use wreq_util::Emulation;

/// Renderer that fetches listing pages with browser impersonation.
pub struct HttpRenderer {
    client: Client,
    page: Option<String>,
    closed: bool,
}

impl HttpRenderer {
    /// Creates a new renderer with the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self { client, page: None, closed: false })
    }

    fn ensure_open(&self) -> Result<(), RenderError> {
        if self.closed {
            return Err(RenderError::Closed);
        }
        Ok(())
    }

    fn loaded_page(&self) -> Result<&str, RenderError> {
        self.ensure_open()?;
        self.page.as_deref().ok_or(RenderError::NotNavigated)
    }

    /// Performs a GET request looking like a desktop browser.
    async fn fetch(&self, url: &str) -> Result<String, RenderError> {
        debug!("GET {}", url);

        let navigation_error =
            |e: wreq::Error| RenderError::Navigation { url: url.to_string(), reason: e.to_string() };

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Sec-Fetch-User", "?1")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .map_err(navigation_error)?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(RenderError::Status { url: url.to_string(), status: status.as_u16() });
        }

        response.text().await.map_err(navigation_error)
    }
}

/// Returns true if `selector` matches anything in `markup`.
fn contains_selector(markup: &str, selector: &Selector) -> bool {
    Html::parse_document(markup).select(selector).next().is_some()
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError> {
        self.ensure_open()?;
        info!("Loading {}", url);

        let body = tokio::time::timeout(timeout, self.fetch(url)).await.map_err(|_| {
            RenderError::Timeout { what: format!("navigation to {}", url), waited: timeout }
        })??;

        debug!("Loaded {} bytes", body.len());
        self.page = Some(body);
        Ok(())
    }

    async fn wait_for_network_idle(&mut self, _timeout: Duration) -> Result<(), RenderError> {
        // The whole document is in hand once the body is read
        self.loaded_page().map(|_| ())
    }

    async fn dismiss_cookie_banner(&mut self, _timeout: Duration) {
        debug!("No cookie banner to dismiss on a static page");
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), RenderError> {
        self.loaded_page().map(|_| ())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), RenderError> {
        let page = self.loaded_page()?;
        let parsed = Selector::parse(selector)
            .map_err(|_| RenderError::InvalidSelector(selector.to_string()))?;

        if contains_selector(page, &parsed) {
            Ok(())
        } else {
            Err(RenderError::Timeout { what: format!("selector '{}'", selector), waited: timeout })
        }
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.loaded_page().map(String::from)
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        debug!("Closing renderer");
        self.page = None;
        self.closed = true;
        Ok(())
    }
}
