//! deal-hound - Listing-page deal extractor with spectacular-discount alerts
//!
//! Loads a shop listing page, turns each product card into a typed record,
//! classifies spectacular discounts and persists the set as JSON.

pub mod commands;
pub mod config;
pub mod deals;
pub mod filters;
pub mod format;
pub mod render;
pub mod report;

pub use config::Config;
pub use deals::{DealSummary, ExtractionSession, Product, Site};
pub use render::{PageRenderer, RenderError};
pub use report::DealReporter;
