//! Deal extraction engine: price parsing, discount classification and
//! per-card product extraction.

pub mod discount;
pub mod extractor;
pub mod models;
pub mod price;
pub mod selectors;
pub mod session;
pub mod sites;

pub use discount::{Pricing, SPECTACULAR_THRESHOLD};
pub use extractor::{CardNode, ExtractError, Extraction, FieldMiss, ProductExtractor};
pub use models::{DealSummary, PriceSample, Product};
pub use selectors::{CardMarkers, FieldMatchers, SelectorConfig};
pub use session::{ExtractionSession, SessionOutcome, SessionStats};
pub use sites::Site;
