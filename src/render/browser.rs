//! Chromium renderer driven through Playwright.
//!
//! Runs the listing page's scripts, so lazy-loaded cards, the cookie consent
//! banner and the visible (`headless = false`) mode all behave as in a real
//! browser. The Playwright driver and its Chromium build are installed on first
//! launch.

use super::{PageRenderer, RenderError};
use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use playwright::api::{Browser, DocumentLoadState, Page, ProxySettings, Viewport};
use playwright::Playwright;
use scraper::Selector;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const SCROLL_ROUNDS: usize = 5;
const SCROLL_PAUSE: Duration = Duration::from_millis(1000);
const READY_POLL: Duration = Duration::from_millis(250);

/// Renderer backed by a Chromium instance.
pub struct BrowserRenderer {
    // The driver connection must outlive the browser
    _playwright: Playwright,
    browser: Option<Browser>,
    page: Page,
    cookie_banner: String,
    navigated: bool,
}

/// Playwright timeouts are fractional milliseconds.
fn millis(duration: Duration) -> f64 {
    duration.as_millis() as f64
}

/// Returns true if a Playwright error message reports an expired wait.
fn is_timeout_message(message: &str) -> bool {
    message.contains("Timeout") || message.contains("timeout")
}

impl BrowserRenderer {
    /// Starts Playwright, launches Chromium and opens one page.
    pub async fn launch(config: &Config) -> Result<Self> {
        config.selectors.cookie_banner_selector()?;

        debug!("Initializing Playwright");
        let playwright =
            Playwright::initialize().await.context("Failed to initialize Playwright")?;
        playwright.prepare().context("Failed to install the Playwright browsers")?;

        let mut launcher = playwright.chromium().launcher().headless(config.headless);
        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            launcher = launcher.proxy(ProxySettings {
                server: proxy_url.clone(),
                bypass: None,
                username: None,
                password: None,
            });
        }

        info!("Launching Chromium (headless: {})", config.headless);
        let browser = launcher.launch().await.context("Failed to launch Chromium")?;

        let page = match Self::open_page(&browser).await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close) = browser.close().await {
                    warn!("Failed to close browser: {}", close);
                }
                return Err(e);
            }
        };

        Ok(Self {
            _playwright: playwright,
            browser: Some(browser),
            page,
            cookie_banner: config.selectors.cookie_banner.clone(),
            navigated: false,
        })
    }

    async fn open_page(browser: &Browser) -> Result<Page> {
        let context = browser
            .context_builder()
            .user_agent(USER_AGENT)
            .viewport(Some(Viewport { width: 1920, height: 1080 }))
            .build()
            .await
            .context("Failed to create browser context")?;

        context.new_page().await.context("Failed to open page")
    }

    fn ensure_open(&self) -> Result<(), RenderError> {
        if self.browser.is_none() {
            return Err(RenderError::Closed);
        }
        Ok(())
    }

    fn loaded_page(&self) -> Result<&Page, RenderError> {
        self.ensure_open()?;
        if !self.navigated {
            return Err(RenderError::NotNavigated);
        }
        Ok(&self.page)
    }

    async fn scroll_height(&self) -> Result<i64, RenderError> {
        let height: serde_json::Value = self
            .page
            .evaluate::<(), serde_json::Value>("document.body.scrollHeight", ())
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;
        Ok(height.as_i64().unwrap_or(0))
    }
}

#[async_trait]
impl PageRenderer for BrowserRenderer {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError> {
        self.ensure_open()?;
        info!("Loading {}", url);

        self.page
            .goto_builder(url)
            .timeout(millis(timeout))
            .wait_until(DocumentLoadState::Load)
            .goto()
            .await
            .map_err(|e| {
                let reason = e.to_string();
                if is_timeout_message(&reason) {
                    RenderError::Timeout { what: format!("navigation to {}", url), waited: timeout }
                } else {
                    RenderError::Navigation { url: url.to_string(), reason }
                }
            })?;

        self.navigated = true;
        Ok(())
    }

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<(), RenderError> {
        let page = self.loaded_page()?;
        let deadline = Instant::now() + timeout;

        loop {
            let state: String = page
                .evaluate::<(), String>("document.readyState", ())
                .await
                .map_err(|e| RenderError::Browser(e.to_string()))?;

            if state == "complete" {
                debug!("Document settled");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(RenderError::Timeout {
                    what: "network idle".to_string(),
                    waited: timeout,
                });
            }
            sleep(READY_POLL).await;
        }
    }

    async fn dismiss_cookie_banner(&mut self, timeout: Duration) {
        let Ok(page) = self.loaded_page() else {
            return;
        };

        let found = page
            .wait_for_selector_builder(&self.cookie_banner)
            .timeout(millis(timeout))
            .wait_for_selector()
            .await;

        match found {
            Ok(Some(_)) => {
                let clicked =
                    page.click_builder(&self.cookie_banner).timeout(millis(timeout)).click().await;
                match clicked {
                    Ok(()) => info!("Dismissed cookie banner"),
                    Err(e) => debug!("Cookie banner could not be clicked: {}", e),
                }
            }
            Ok(None) => debug!("No cookie banner"),
            Err(e) => debug!("No cookie banner within {}ms: {}", timeout.as_millis(), e),
        }
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), RenderError> {
        self.loaded_page()?;

        for round in 0..SCROLL_ROUNDS {
            let before = self.scroll_height().await?;
            self.page
                .evaluate::<(), ()>("window.scrollTo(0, document.body.scrollHeight)", ())
                .await
                .map_err(|e| RenderError::Browser(e.to_string()))?;
            sleep(SCROLL_PAUSE).await;

            let after = self.scroll_height().await?;
            if after <= before {
                debug!("Page stopped growing after {} scrolls", round + 1);
                break;
            }
        }

        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), RenderError> {
        let page = self.loaded_page()?;
        Selector::parse(selector).map_err(|_| RenderError::InvalidSelector(selector.to_string()))?;

        let expired =
            || RenderError::Timeout { what: format!("selector '{}'", selector), waited: timeout };

        let found = page
            .wait_for_selector_builder(selector)
            .timeout(millis(timeout))
            .wait_for_selector()
            .await;

        match found {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(expired()),
            Err(e) if is_timeout_message(&e.to_string()) => Err(expired()),
            Err(e) => Err(RenderError::Browser(e.to_string())),
        }
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.loaded_page()?.content().await.map_err(|e| RenderError::Browser(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        let Some(browser) = self.browser.take() else {
            return Ok(());
        };

        debug!("Closing browser");
        browser.close().await.map_err(|e| RenderError::Browser(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis() {
        assert_eq!(millis(Duration::from_secs(3)), 3000.0);
        assert_eq!(millis(Duration::from_millis(250)), 250.0);
    }

    #[test]
    fn test_timeout_messages() {
        assert!(is_timeout_message("Timeout 30000ms exceeded."));
        assert!(is_timeout_message("page.goto: timeout while navigating"));
        assert!(!is_timeout_message("net::ERR_NAME_NOT_RESOLVED"));
    }
}
