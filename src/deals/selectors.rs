//! CSS selectors for listing cards and their fields.
//!
//! Every selector lives in [`SelectorConfig`] as a plain string so that a
//! storefront markup change is a config edit. Each field holds an ordered
//! fallback list: the first selector that yields a usable value wins.
//!
//! **Update process**: when extraction starts missing fields, capture an HTML
//! sample, add a selector to the front of the relevant list, and add a test
//! fixture.

use anyhow::{anyhow, Result};
use scraper::Selector;
use serde::{Deserialize, Serialize};

/// Selector strings for card discovery and field extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Card container tiers; the first tier that matches any card is used
    #[serde(default = "default_card_tiers")]
    pub cards: Vec<Vec<String>>,

    /// Product name, most specific first
    #[serde(default = "default_name")]
    pub name: Vec<String>,

    /// Product link
    #[serde(default = "default_link")]
    pub link: Vec<String>,

    /// Element holding only the current/sale price
    #[serde(default = "default_current_price")]
    pub current_price: Vec<String>,

    /// Element holding only the original/regular price
    #[serde(default = "default_original_price")]
    pub original_price: Vec<String>,

    /// Any price-bearing element, possibly holding both prices
    #[serde(default = "default_price")]
    pub price: Vec<String>,

    /// Accept button of the cookie consent banner
    #[serde(default = "default_cookie_banner")]
    pub cookie_banner: String,
}

fn strings(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| s.to_string()).collect()
}

fn default_card_tiers() -> Vec<Vec<String>> {
    vec![
        strings(&[".product-item", "[data-testid='product-card']", ".product-card"]),
        strings(&["article", ".card", ".item"]),
    ]
}

fn default_name() -> Vec<String> {
    strings(&[
        "a h2, a h3",
        "h2, h3",
        ".product-name",
        "[class*='title']",
        "a[class*='name']",
    ])
}

fn default_link() -> Vec<String> {
    strings(&["a[href]"])
}

fn default_current_price() -> Vec<String> {
    strings(&[
        "[class*='sale-price']",
        "[class*='special-price']",
        "[class*='current-price']",
        "[class*='final-price']",
    ])
}

fn default_original_price() -> Vec<String> {
    strings(&[
        "[class*='original-price']",
        "[class*='regular-price']",
        "[class*='old-price']",
        "s",
        "del",
    ])
}

fn default_price() -> Vec<String> {
    strings(&["[class*='price']", ".price", "[class*='cost']"])
}

fn default_cookie_banner() -> String {
    "#onetrust-accept-btn-handler, button[id*='accept'], button[class*='accept']".to_string()
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            cards: default_card_tiers(),
            name: default_name(),
            link: default_link(),
            current_price: default_current_price(),
            original_price: default_original_price(),
            price: default_price(),
            cookie_banner: default_cookie_banner(),
        }
    }
}

impl SelectorConfig {
    /// Compiles the cookie banner selector.
    pub fn cookie_banner_selector(&self) -> Result<Selector> {
        compile("cookie banner", &self.cookie_banner)
    }
}

/// Compiles one selector, naming the field on failure.
fn compile(field: &str, selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| anyhow!("Invalid {} selector '{}': {:?}", field, selector, e))
}

fn compile_all(field: &str, selectors: &[String]) -> Result<Vec<Selector>> {
    selectors.iter().map(|s| compile(field, s)).collect()
}

/// Compiled per-field fallback chains.
#[derive(Debug, Clone)]
pub struct FieldMatchers {
    pub name: Vec<Selector>,
    pub link: Vec<Selector>,
    pub current_price: Vec<Selector>,
    pub original_price: Vec<Selector>,
    pub price: Vec<Selector>,
}

impl FieldMatchers {
    /// Compiles the field selectors of `config`.
    pub fn compile(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            name: compile_all("name", &config.name)?,
            link: compile_all("link", &config.link)?,
            current_price: compile_all("current price", &config.current_price)?,
            original_price: compile_all("original price", &config.original_price)?,
            price: compile_all("price", &config.price)?,
        })
    }
}

/// Compiled card container tiers.
#[derive(Debug, Clone)]
pub struct CardMarkers {
    tiers: Vec<Selector>,
    wait_selector: String,
}

impl CardMarkers {
    /// Compiles the card tiers of `config`; each tier becomes one selector group.
    pub fn compile(config: &SelectorConfig) -> Result<Self> {
        let groups: Vec<String> =
            config.cards.iter().filter(|tier| !tier.is_empty()).map(|tier| tier.join(", ")).collect();

        if groups.is_empty() {
            return Err(anyhow!("At least one card selector tier is required"));
        }

        let tiers = groups.iter().map(|group| compile("card", group)).collect::<Result<_>>()?;

        Ok(Self { tiers, wait_selector: groups.join(", ") })
    }

    /// Card selector groups in priority order.
    pub fn tiers(&self) -> &[Selector] {
        &self.tiers
    }

    /// Selector matching a card of any tier, used to wait for the listing.
    pub fn wait_selector(&self) -> &str {
        &self.wait_selector
    }
}
