//! Name search filtering.

use super::Filter;
use crate::deals::Product;

/// Filters products by words in the name.
pub struct KeywordFilter {
    /// Words that must appear in the name.
    required: Vec<String>,
    /// Words that must NOT appear in the name.
    excluded: Vec<String>,
}

impl KeywordFilter {
    /// Creates a new keyword filter.
    pub fn new(required: Vec<String>, excluded: Vec<String>) -> Self {
        Self {
            required: required.into_iter().map(|k| k.to_lowercase()).collect(),
            excluded: excluded.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Creates a filter from a free-text search; every word must match.
    pub fn search(query: &str) -> Self {
        Self::new(query.split_whitespace().map(String::from).collect(), Vec::new())
    }

    /// Creates a filter with only excluded words.
    pub fn excluded(keywords: Vec<String>) -> Self {
        Self::new(Vec::new(), keywords)
    }
}

impl Filter for KeywordFilter {
    fn matches(&self, product: &Product) -> bool {
        let name = product.name.to_lowercase();

        self.required.iter().all(|k| name.contains(k.as_str()))
            && !self.excluded.iter().any(|k| name.contains(k.as_str()))
    }

    fn description(&self) -> String {
        let mut parts = Vec::new();

        if !self.required.is_empty() {
            parts.push(format!("Name contains: {}", self.required.join(" ")));
        }

        if !self.excluded.is_empty() {
            parts.push(format!("Name excludes: {}", self.excluded.join(", ")));
        }

        if parts.is_empty() {
            "Name: any".to_string()
        } else {
            parts.join("; ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deals::{Pricing, SPECTACULAR_THRESHOLD};

    fn make_product(name: &str) -> Product {
        Product::new(name, "https://shop.asus.com/us/p", Pricing::new(999.0, None), SPECTACULAR_THRESHOLD)
    }

    #[test]
    fn test_search_all_words() {
        let filter = KeywordFilter::search("zen aio");

        assert!(filter.matches(&make_product("ASUS Zen AiO 24")));
        assert!(filter.matches(&make_product("ZEN AIO 27 (M5402)"))); // Case insensitive
        assert!(!filter.matches(&make_product("ASUS Zenbook 14")));
    }

    #[test]
    fn test_search_partial_word() {
        let filter = KeywordFilter::search("zen");
        assert!(filter.matches(&make_product("ASUS Zenbook 14")));
        assert!(filter.matches(&make_product("Zen AiO 24")));
    }

    #[test]
    fn test_excluded_keywords() {
        let filter = KeywordFilter::excluded(vec!["Refurbished".to_string()]);

        assert!(filter.matches(&make_product("ASUS Zen AiO 24")));
        assert!(!filter.matches(&make_product("Refurbished ASUS AiO")));
    }

    #[test]
    fn test_empty_search_matches_all() {
        let filter = KeywordFilter::search("   ");
        assert!(filter.matches(&make_product("Anything at all")));
        assert_eq!(filter.description(), "Name: any");
    }

    #[test]
    fn test_description() {
        let filter = KeywordFilter::new(vec!["Zen".to_string()], vec!["used".to_string()]);
        let desc = filter.description();
        assert!(desc.contains("Name contains: zen"));
        assert!(desc.contains("Name excludes: used"));
    }
}
