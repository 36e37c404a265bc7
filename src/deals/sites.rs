//! Known shop domains and URL resolution against their origins.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Shop sites whose listing pages are known to the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Site {
    AsusShop,
    AsusStore,
    RogStore,
    AsusEstore,
}

impl Site {
    /// Returns the domain for this site.
    pub fn domain(&self) -> &'static str {
        match self {
            Site::AsusShop => "shop.asus.com",
            Site::AsusStore => "www.asus.com",
            Site::RogStore => "rog.asus.com",
            Site::AsusEstore => "estore.asus.com",
        }
    }

    /// Returns the origin that relative product links resolve against.
    pub fn base_url(&self) -> String {
        format!("https://{}", self.domain())
    }

    /// Returns all known sites.
    pub fn all() -> &'static [Site] {
        &[Site::AsusShop, Site::AsusStore, Site::RogStore, Site::AsusEstore]
    }

    /// Finds the known site a listing URL belongs to.
    pub fn from_listing_url(listing_url: &str) -> Option<Site> {
        let url = Url::parse(listing_url).ok()?;
        let host = url.host_str()?;

        Site::all().iter().copied().find(|site| host.eq_ignore_ascii_case(site.domain()))
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Site::AsusShop => "asus-shop",
            Site::AsusStore => "asus-store",
            Site::RogStore => "rog-store",
            Site::AsusEstore => "asus-estore",
        };
        write!(f, "{}", code)
    }
}

impl FromStr for Site {
    type Err = SiteParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Site::all()
            .iter()
            .copied()
            .find(|site| site.to_string() == lower || site.domain() == lower)
            .ok_or_else(|| SiteParseError(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct SiteParseError(String);

impl fmt::Display for SiteParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown site '{}'. Valid sites: asus-shop, asus-store, rog-store, asus-estore",
            self.0
        )
    }
}

impl std::error::Error for SiteParseError {}

/// Returns the origin for resolving relative links found on `listing_url`.
///
/// A known site maps to its canonical origin; anything else falls back to the
/// listing URL's own scheme and host.
pub fn base_origin(listing_url: &str) -> Result<Url> {
    if let Some(site) = Site::from_listing_url(listing_url) {
        return Url::parse(&site.base_url())
            .with_context(|| format!("Invalid origin for site {}", site));
    }

    let url = Url::parse(listing_url)
        .with_context(|| format!("Invalid listing URL: {}", listing_url))?;

    url.join("/").with_context(|| format!("Listing URL has no origin: {}", listing_url))
}

/// Resolves an extracted link against `origin`.
///
/// Absolute links pass through unchanged.
pub fn resolve_url(origin: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }

    origin.join(href).ok().map(String::from)
}
