//! Drives extraction over every card of one listing page.

use crate::config::Config;
use crate::deals::extractor::{CardNode, Extraction, FieldMiss, ProductExtractor};
use crate::deals::models::Product;
use crate::deals::selectors::{CardMarkers, FieldMatchers};
use crate::deals::sites::base_origin;
use crate::render::{PageRenderer, RenderError, RenderedPage};
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Per-run extraction counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Cards handed to the session
    pub cards: usize,
    /// Cards without a usable name
    pub missing_name: usize,
    /// Cards without a current price
    pub missing_price: usize,
    /// Cards whose nodes could not be read
    pub card_faults: usize,
    /// Products whose original price read below the current price
    pub price_anomalies: usize,
}

/// Products extracted from one page, in card order.
#[derive(Debug, Clone, Default)]
pub struct SessionOutcome {
    pub products: Vec<Product>,
    pub stats: SessionStats,
    /// Set when the page could not be rendered; no products are returned then
    pub aborted: Option<String>,
}

impl SessionOutcome {
    fn aborted(reason: &RenderError) -> Self {
        Self { aborted: Some(reason.to_string()), ..Default::default() }
    }

    /// Returns true if the run was cut short by a rendering failure.
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }
}

/// Waits used while loading the listing.
#[derive(Debug, Clone, Copy)]
struct Timeouts {
    navigation: Duration,
    selector: Duration,
    cookie_banner: Duration,
}

/// Extraction over one listing page.
pub struct ExtractionSession {
    listing_url: String,
    extractor: ProductExtractor,
    markers: CardMarkers,
    timeouts: Timeouts,
}

impl ExtractionSession {
    /// Creates a session, compiling the configured selectors.
    ///
    /// Fails when the spectacular threshold is not a percentage in `0..=100`.
    pub fn new(config: &Config) -> Result<Self> {
        let threshold = config.spectacular_threshold;
        anyhow::ensure!(
            (0.0..=100.0).contains(&threshold),
            "Spectacular threshold must be between 0 and 100, got {}",
            threshold
        );

        let matchers = FieldMatchers::compile(&config.selectors)?;
        let markers = CardMarkers::compile(&config.selectors)?;
        let origin = base_origin(&config.listing_url)?;
        debug!("Resolving relative links against {}", origin);

        Ok(Self {
            listing_url: config.listing_url.clone(),
            extractor: ProductExtractor::new(
                matchers,
                origin,
                &config.listing_url,
                threshold,
            ),
            markers,
            timeouts: Timeouts {
                navigation: Duration::from_millis(config.navigation_timeout_ms),
                selector: Duration::from_millis(config.selector_timeout_ms),
                cookie_banner: Duration::from_millis(config.cookie_banner_timeout_ms),
            },
        })
    }

    /// Renders the listing page and extracts every card.
    ///
    /// Rendering failures end the run with no products. The renderer is
    /// closed on every path.
    pub async fn run<R: PageRenderer>(&self, renderer: &mut R) -> SessionOutcome {
        let rendered = self.render(renderer).await;

        if let Err(e) = renderer.close().await {
            warn!("Failed to close renderer: {}", e);
        }

        match rendered {
            Ok(markup) => self.extract_markup(&markup),
            Err(e) => {
                if e.is_timeout() {
                    error!("Product cards never appeared: {}", e);
                } else {
                    error!("Failed to render listing page: {}", e);
                }
                SessionOutcome::aborted(&e)
            }
        }
    }

    async fn render<R: PageRenderer>(&self, renderer: &mut R) -> Result<String, RenderError> {
        info!("Loading listing page {}", self.listing_url);
        renderer.navigate(&self.listing_url, self.timeouts.navigation).await?;
        renderer.wait_for_network_idle(self.timeouts.navigation).await?;
        renderer.dismiss_cookie_banner(self.timeouts.cookie_banner).await;
        renderer.scroll_to_bottom().await?;
        renderer.wait_for_selector(self.markers.wait_selector(), self.timeouts.selector).await?;
        renderer.content().await
    }

    /// Extracts every card found in a markup snapshot.
    pub fn extract_markup(&self, markup: &str) -> SessionOutcome {
        let page = RenderedPage::parse(markup);
        let cards = page.cards(&self.markers);
        info!("Found {} cards", cards.len());
        self.extract(cards)
    }

    /// Extracts cards in order. A card that fails is logged and skipped.
    pub fn extract<C: CardNode>(&self, cards: impl IntoIterator<Item = C>) -> SessionOutcome {
        let mut outcome = SessionOutcome::default();

        for (index, card) in cards.into_iter().enumerate() {
            outcome.stats.cards += 1;

            match self.extractor.extract(&card) {
                Ok(Extraction::Product { product, clamped }) => {
                    trace!("Card {}: {} - {:.2}", index, product.name, product.current_price);
                    if clamped {
                        outcome.stats.price_anomalies += 1;
                    }
                    outcome.products.push(product);
                }
                Ok(Extraction::Skipped(FieldMiss::Name)) => outcome.stats.missing_name += 1,
                Ok(Extraction::Skipped(FieldMiss::CurrentPrice)) => {
                    debug!("Card {} has no current price", index);
                    outcome.stats.missing_price += 1;
                }
                Err(e) => {
                    warn!("Failed to process card {}: {}", index, e);
                    outcome.stats.card_faults += 1;
                }
            }
        }

        info!(
            "Extracted {} products from {} cards ({} without name, {} without price, {} faults)",
            outcome.products.len(),
            outcome.stats.cards,
            outcome.stats.missing_name,
            outcome.stats.missing_price,
            outcome.stats.card_faults
        );

        outcome
    }
}
