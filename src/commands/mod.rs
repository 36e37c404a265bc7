//! CLI command implementations.

pub mod scrape;
pub mod show;

pub use scrape::ScrapeCommand;
pub use show::{ShowCommand, ShowOptions};
