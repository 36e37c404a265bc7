//! Output formatting for products and run summaries (table, JSON, markdown, CSV).

use crate::config::OutputFormat;
use crate::deals::{DealSummary, Product};

const NAME_WIDTH: usize = 50;

/// Formats products for output.
pub struct Formatter {
    format: OutputFormat,
}

/// Shortens `s` to `width` characters, ending in "..." when cut.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let head: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

fn money(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats multiple products.
    pub fn format_products(&self, products: &[Product]) -> String {
        if products.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => self.csv_header(),
                _ => "No products found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_products(products),
            OutputFormat::Table => self.table_products(products),
            OutputFormat::Markdown => self.markdown_products(products),
            OutputFormat::Csv => self.csv_products(products),
        }
    }

    /// Formats the aggregate figures of a run.
    pub fn format_summary(&self, summary: &DealSummary) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Table => [
                format!("Products:          {}", summary.total),
                format!("Spectacular deals: {}", summary.spectacular),
                format!("Average discount:  {:.2}%", summary.average_discount),
            ]
            .join("\n"),
            OutputFormat::Markdown => [
                format!("- **Products:** {}", summary.total),
                format!("- **Spectacular deals:** {}", summary.spectacular),
                format!("- **Average discount:** {:.2}%", summary.average_discount),
            ]
            .join("\n"),
            OutputFormat::Csv => format!(
                "total,spectacular,average_discount\n{},{},{}",
                summary.total, summary.spectacular, summary.average_discount
            ),
        }
    }

    // JSON formatting

    fn json_products(&self, products: &[Product]) -> String {
        serde_json::to_string_pretty(products).unwrap_or_else(|_| "[]".to_string())
    }

    // Table formatting

    fn table_products(&self, products: &[Product]) -> String {
        let price_width = 10;
        let discount_width = 8;
        let deal_width = 4;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:>price_width$}  {:>price_width$}  {:>discount_width$}  {:<deal_width$}  {}",
            "Price", "Was", "Discount", "Deal", "Name"
        ));
        lines.push(format!(
            "{:-<price_width$}  {:-<price_width$}  {:-<discount_width$}  {:-<deal_width$}  {:-<NAME_WIDTH$}",
            "", "", "", "", ""
        ));

        for product in products {
            let deal = if product.is_spectacular_deal { "🔥" } else { "" };

            lines.push(format!(
                "{:>price_width$}  {:>price_width$}  {:>discount_width$}  {:<deal_width$}  {}",
                money(Some(product.current_price)),
                money(product.original_price),
                format!("{:.2}%", product.discount),
                deal,
                truncate(&product.name, NAME_WIDTH)
            ));
        }

        let summary = DealSummary::from_products(products);
        lines.push(String::new());
        lines.push(format!(
            "Total: {} products, {} spectacular, {:.2}% average discount",
            summary.total, summary.spectacular, summary.average_discount
        ));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_products(&self, products: &[Product]) -> String {
        let mut lines = Vec::new();

        lines.push("| Price | Was | Discount | Deal | Name |".to_string());
        lines.push("|-------|-----|----------|------|------|".to_string());

        for product in products {
            let was = match product.original_price {
                Some(original) => format!("~~{:.2}~~", original),
                None => String::new(),
            };
            let deal = if product.is_spectacular_deal { "🔥" } else { "" };

            lines.push(format!(
                "| {:.2} | {} | {:.2}% | {} | [{}]({}) |",
                product.current_price,
                was,
                product.discount,
                deal,
                truncate(&product.name, 40).replace('|', "\\|"),
                product.url
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} products found*", products.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_header(&self) -> String {
        "id,name,current_price,original_price,discount,spectacular,last_updated,url".to_string()
    }

    fn csv_products(&self, products: &[Product]) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header());

        for product in products {
            let original = product.original_price.map(|o| o.to_string()).unwrap_or_default();

            lines.push(format!(
                "{},{},{},{},{},{},{},{}",
                product.id,
                Self::csv_escape(&product.name),
                product.current_price,
                original,
                product.discount,
                product.is_spectacular_deal,
                product.last_updated.to_rfc3339(),
                Self::csv_escape(&product.url)
            ));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deals::{Pricing, SPECTACULAR_THRESHOLD};

    fn make_product(name: &str, current: f64, original: Option<f64>) -> Product {
        Product::new(
            name,
            "https://shop.asus.com/us/zen-aio-24",
            Pricing::new(current, original),
            SPECTACULAR_THRESHOLD,
        )
    }

    fn make_products() -> Vec<Product> {
        vec![
            make_product("ASUS Zen AiO 24", 399.99, Some(999.99)),
            make_product("ASUS Vivo AiO, 27\"", 749.0, None),
        ]
    }

    #[test]
    fn test_empty_products() {
        assert_eq!(Formatter::new(OutputFormat::Json).format_products(&[]), "[]");
        assert_eq!(Formatter::new(OutputFormat::Table).format_products(&[]), "No products found.");
        assert_eq!(
            Formatter::new(OutputFormat::Markdown).format_products(&[]),
            "No products found."
        );
        assert!(Formatter::new(OutputFormat::Csv).format_products(&[]).starts_with("id,name"));
    }

    #[test]
    fn test_json_products() {
        let output = Formatter::new(OutputFormat::Json).format_products(&make_products());
        let parsed: Vec<Product> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(output.contains("\"currentPrice\": 399.99"));
    }

    #[test]
    fn test_table_products() {
        let output = Formatter::new(OutputFormat::Table).format_products(&make_products());

        assert!(output.contains("Price"));
        assert!(output.contains("Discount"));
        assert!(output.contains("399.99"));
        assert!(output.contains("999.99"));
        assert!(output.contains("60.00%"));
        assert!(output.contains("🔥"));
        assert!(output.contains("Total: 2 products, 1 spectacular"));
    }

    #[test]
    fn test_table_truncates_long_names() {
        let long = "ASUS ".repeat(20);
        let output =
            Formatter::new(OutputFormat::Table).format_products(&[make_product(&long, 1.0, None)]);
        assert!(output.contains("..."));
        assert!(!output.contains(long.trim()));
    }

    #[test]
    fn test_markdown_products() {
        let output = Formatter::new(OutputFormat::Markdown).format_products(&make_products());

        assert!(output.contains("| Price | Was |"));
        assert!(output.contains("~~999.99~~"));
        assert!(output.contains("[ASUS Zen AiO 24](https://shop.asus.com/us/zen-aio-24)"));
        assert!(output.contains("*2 products found*"));
    }

    #[test]
    fn test_csv_products() {
        let output = Formatter::new(OutputFormat::Csv).format_products(&make_products());
        let lines: Vec<_> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains(",ASUS Zen AiO 24,399.99,999.99,60,true,"));
        // Name with comma and quote is escaped; missing original is empty
        assert!(lines[2].contains(",\"ASUS Vivo AiO, 27\"\"\",749,,0,false,"));
    }

    #[test]
    fn test_format_summary() {
        let summary = DealSummary::from_products(&make_products());

        let table = Formatter::new(OutputFormat::Table).format_summary(&summary);
        assert!(table.contains("Products:          2"));
        assert!(table.contains("Spectacular deals: 1"));
        assert!(table.contains("30.00%"));

        let json = Formatter::new(OutputFormat::Json).format_summary(&summary);
        assert!(json.contains("\"averageDiscount\": 30.0"));

        let csv = Formatter::new(OutputFormat::Csv).format_summary(&summary);
        assert_eq!(csv, "total,spectacular,average_discount\n2,1,30");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ÄÖÜÄÖÜÄÖÜÄÖÜ", 6), "ÄÖÜ...");
    }
}
