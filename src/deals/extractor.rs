//! Turns one listing card into at most one [`Product`].
//!
//! Storefront markup drifts without notice, so each field is resolved through
//! an ordered fallback chain of selectors and a missing field is a normal
//! outcome. Only an unreadable card node is an error.

use crate::deals::discount::Pricing;
use crate::deals::models::Product;
use crate::deals::price::{parse_price, scan_prices};
use crate::deals::selectors::FieldMatchers;
use crate::deals::sites::resolve_url;
use scraper::{ElementRef, Node, Selector};
use thiserror::Error;
use tracing::{trace, warn};
use url::Url;

/// Failure to read a card node at all.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("card node could not be read during {operation}: {reason}")]
    NodeAccess { operation: &'static str, reason: String },
}

/// A queryable fragment of a rendered page.
pub trait CardNode: Sized {
    /// Returns the first descendant matching `selector`.
    fn query(&self, selector: &Selector) -> Result<Option<Self>, ExtractError>;

    /// Returns every descendant matching `selector`, in document order.
    fn query_all(&self, selector: &Selector) -> Result<Vec<Self>, ExtractError>;

    /// Whether this node itself matches `selector`.
    fn matches(&self, selector: &Selector) -> Result<bool, ExtractError>;

    /// Returns the rendered text, with line breaks as `\n`.
    fn inner_text(&self) -> Result<String, ExtractError>;

    /// Returns the inner markup.
    fn inner_html(&self) -> Result<String, ExtractError>;

    /// Returns an attribute value.
    fn attribute(&self, name: &str) -> Result<Option<String>, ExtractError>;
}

impl<'a> CardNode for ElementRef<'a> {
    fn query(&self, selector: &Selector) -> Result<Option<Self>, ExtractError> {
        Ok(self.select(selector).next())
    }

    fn query_all(&self, selector: &Selector) -> Result<Vec<Self>, ExtractError> {
        Ok(self.select(selector).collect())
    }

    fn matches(&self, selector: &Selector) -> Result<bool, ExtractError> {
        Ok(selector.matches(self))
    }

    fn inner_text(&self) -> Result<String, ExtractError> {
        let mut text = String::new();

        for node in self.descendants() {
            match node.value() {
                Node::Text(fragment) => {
                    let hidden = node
                        .parent()
                        .and_then(|parent| parent.value().as_element())
                        .is_some_and(|el| matches!(el.name(), "script" | "style"));
                    if !hidden {
                        text.push_str(fragment);
                    }
                }
                Node::Element(el) if el.name() == "br" => text.push('\n'),
                _ => {}
            }
        }

        Ok(text)
    }

    fn inner_html(&self) -> Result<String, ExtractError> {
        Ok(ElementRef::inner_html(self))
    }

    fn attribute(&self, name: &str) -> Result<Option<String>, ExtractError> {
        Ok(self.value().attr(name).map(String::from))
    }
}

/// Field that made a card yield no product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMiss {
    Name,
    CurrentPrice,
}

/// Result of extracting one card.
#[derive(Debug, Clone)]
pub enum Extraction {
    /// A product; `clamped` is set when the original price read below the current one
    Product { product: Product, clamped: bool },
    /// The card is not a product (a mandatory field is missing)
    Skipped(FieldMiss),
}

/// Collapses line breaks and whitespace runs into single spaces.
pub fn normalize_name(raw: &str) -> String {
    raw.replace("<br />", " ")
        .replace("<br/>", " ")
        .replace("<br>", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts products from cards using per-field fallback chains.
#[derive(Debug, Clone)]
pub struct ProductExtractor {
    matchers: FieldMatchers,
    origin: Url,
    listing_url: String,
    threshold: f64,
}

impl ProductExtractor {
    /// Creates an extractor.
    ///
    /// `origin` resolves relative links; `listing_url` stands in for cards
    /// that carry no link at all.
    pub fn new(
        matchers: FieldMatchers,
        origin: Url,
        listing_url: impl Into<String>,
        threshold: f64,
    ) -> Self {
        Self { matchers, origin, listing_url: listing_url.into(), threshold }
    }

    /// Extracts one card.
    pub fn extract<C: CardNode>(&self, card: &C) -> Result<Extraction, ExtractError> {
        let Some(name) = self.extract_name(card)? else {
            trace!("Card has no name, skipping");
            return Ok(Extraction::Skipped(FieldMiss::Name));
        };

        let url = self.extract_url(card)?;

        let Some((current, original)) = self.extract_prices(card)? else {
            trace!("Card '{}' has no current price, skipping", name);
            return Ok(Extraction::Skipped(FieldMiss::CurrentPrice));
        };

        let pricing = Pricing::new(current, original);
        if pricing.clamped {
            warn!(
                "Original price {:?} below current price {:.2} for '{}', treating as no discount",
                original, current, name
            );
        }

        let product = Product::new(name, url, pricing, self.threshold);
        Ok(Extraction::Product { product, clamped: pricing.clamped })
    }

    fn extract_name<C: CardNode>(&self, card: &C) -> Result<Option<String>, ExtractError> {
        for selector in &self.matchers.name {
            if let Some(node) = card.query(selector)? {
                let name = normalize_name(&node.inner_text()?);
                if !name.is_empty() {
                    return Ok(Some(name));
                }
            }
        }
        Ok(None)
    }

    fn extract_url<C: CardNode>(&self, card: &C) -> Result<String, ExtractError> {
        // The card itself may be the link
        let mut href = card.attribute("href")?;

        for selector in &self.matchers.link {
            if href.is_some() {
                break;
            }
            if let Some(node) = card.query(selector)? {
                href = node.attribute("href")?;
            }
        }

        Ok(href
            .and_then(|href| resolve_url(&self.origin, &href))
            .unwrap_or_else(|| self.listing_url.clone()))
    }

    /// Returns (current, original) prices, or None when no current price resolves.
    ///
    /// A dedicated original-price element wins over a higher amount rendered
    /// next to the current price.
    fn extract_prices<C: CardNode>(
        &self,
        card: &C,
    ) -> Result<Option<(f64, Option<f64>)>, ExtractError> {
        let original = self
            .first_span(card, &self.matchers.original_price)?
            .map(|(low, high)| high.unwrap_or(low));

        if let Some((current, embedded)) = self.first_span(card, &self.matchers.current_price)? {
            return Ok(Some((current, original.or(embedded))));
        }

        // No dedicated sale-price element; try generic price elements in
        // document order, passing over struck-through originals and labels
        for selector in &self.matchers.price {
            for node in card.query_all(selector)? {
                if self.is_original(&node)? {
                    continue;
                }
                if let Some((current, embedded)) = price_span(&element_prices(&node)?) {
                    return Ok(Some((current, original.or(embedded))));
                }
            }
        }

        let mut values = scan_prices(&card.inner_html()?);
        values.retain(|v| *v > 0.0);

        Ok(price_span(&values).map(|(current, embedded)| (current, original.or(embedded))))
    }

    /// First element in `selectors` order that carries a usable price.
    fn first_span<C: CardNode>(
        &self,
        card: &C,
        selectors: &[Selector],
    ) -> Result<Option<(f64, Option<f64>)>, ExtractError> {
        for selector in selectors {
            if let Some(node) = card.query(selector)? {
                if let Some(span) = price_span(&element_prices(&node)?) {
                    return Ok(Some(span));
                }
            }
        }
        Ok(None)
    }

    fn is_original<C: CardNode>(&self, node: &C) -> Result<bool, ExtractError> {
        for selector in &self.matchers.original_price {
            if node.matches(selector)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Reads the positive amounts in one price element.
///
/// Currency-prefixed amounts are scanned first so an element holding both the
/// sale and the struck-through price splits cleanly. Bare numbers are read
/// only when no currency symbol is present.
fn element_prices<C: CardNode>(node: &C) -> Result<Vec<f64>, ExtractError> {
    let text = node.inner_text()?;
    let mut values = scan_prices(&text);
    if values.is_empty() {
        values.extend(parse_price(&text));
    }
    values.retain(|v| *v > 0.0);
    Ok(values)
}

/// Lowest amount plus the highest one when there are at least two.
fn price_span(values: &[f64]) -> Option<(f64, Option<f64>)> {
    let min = values.iter().copied().reduce(f64::min)?;
    let max = values.iter().copied().fold(min, f64::max);
    Some((min, (values.len() >= 2).then_some(max)))
}
