//! Page-rendering service boundary.
//!
//! A [`PageRenderer`] loads the listing page and hands back a markup snapshot;
//! [`RenderedPage`] turns that snapshot into card nodes using the configured
//! card markers.

#[cfg(feature = "browser")]
pub mod browser;
pub mod http;

use crate::config::Config;
use crate::deals::selectors::CardMarkers;
use async_trait::async_trait;
use scraper::{ElementRef, Html};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(feature = "browser")]
pub use browser::BrowserRenderer;
pub use http::HttpRenderer;

/// Failures of the rendering service.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("{url} returned HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("timed out after {}ms waiting for {what}", .waited.as_millis())]
    Timeout { what: String, waited: Duration },

    #[error("invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("no page has been loaded")]
    NotNavigated,

    #[error("renderer is closed")]
    Closed,

    #[error("browser error: {0}")]
    Browser(String),
}

impl RenderError {
    /// Returns true if this is a wait that expired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RenderError::Timeout { .. })
    }
}

/// Which [`PageRenderer`] a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    /// Static markup fetched over HTTP
    Http,
    /// Chromium driven through Playwright (`browser` feature)
    Browser,
}

impl RendererKind {
    /// Picks the browser whenever it is compiled in, the HTTP renderer otherwise.
    pub fn for_config(config: &Config) -> Self {
        Self::choose(config.headless, cfg!(feature = "browser"))
    }

    fn choose(headless: bool, browser_built: bool) -> Self {
        if browser_built {
            return RendererKind::Browser;
        }
        if !headless {
            warn!("Visible rendering needs the `browser` feature, using the HTTP renderer");
        }
        RendererKind::Http
    }
}

/// Trait for page rendering - enables mocking for tests.
#[async_trait]
pub trait PageRenderer: Send {
    /// Loads `url`, failing if it does not finish within `timeout`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError>;

    /// Waits until network activity settles.
    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<(), RenderError>;

    /// Dismisses a cookie banner if one shows up within `timeout`. Never fails.
    async fn dismiss_cookie_banner(&mut self, timeout: Duration);

    /// Scrolls to the bottom to trigger lazy-loaded content.
    async fn scroll_to_bottom(&mut self) -> Result<(), RenderError>;

    /// Waits for `selector` to match, returning [`RenderError::Timeout`] on expiry.
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), RenderError>;

    /// Returns the current rendered markup.
    async fn content(&mut self) -> Result<String, RenderError>;

    /// Releases the page and everything behind it.
    async fn close(&mut self) -> Result<(), RenderError>;
}

/// A parsed markup snapshot.
pub struct RenderedPage {
    document: Html,
}

impl RenderedPage {
    /// Parses a snapshot.
    pub fn parse(markup: &str) -> Self {
        Self { document: Html::parse_document(markup) }
    }

    /// Returns the cards of the first marker tier that matches anything, in page order.
    pub fn cards(&self, markers: &CardMarkers) -> Vec<ElementRef<'_>> {
        for (tier, selector) in markers.tiers().iter().enumerate() {
            let cards: Vec<_> = self.document.select(selector).collect();
            if !cards.is_empty() {
                debug!("Card tier {} matched {} cards", tier, cards.len());
                return cards;
            }
        }
        Vec::new()
    }
}
