//! deal-hound - Listing-page deal extractor with spectacular-discount alerts
//!
//! Extracts products from a shop listing page and alerts on spectacular deals.

use anyhow::Result;
use clap::{Parser, Subcommand};
use deal_hound::commands::{ScrapeCommand, ShowCommand, ShowOptions};
use deal_hound::config::{Config, OutputFormat};
use deal_hound::deals::Site;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "deal-hound",
    version,
    about = "Listing-page deal extractor with spectacular-discount alerts",
    long_about = "Extracts products from a shop listing page, classifies spectacular discounts, saves them as JSON and sends Telegram alerts for the best deals."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the listing page and save the products
    #[command(alias = "s")]
    Scrape {
        /// Listing page URL
        #[arg(long, env = "DEAL_HOUND_URL")]
        url: Option<String>,

        /// Output file
        #[arg(short, long, env = "DEAL_HOUND_OUTPUT")]
        output: Option<PathBuf>,

        /// Minimum discount percentage for a spectacular deal
        #[arg(long, env = "DEAL_HOUND_THRESHOLD")]
        threshold: Option<f64>,

        /// Proxy URL (e.g., socks5://host:port)
        #[arg(long, env = "DEAL_HOUND_PROXY")]
        proxy: Option<String>,

        /// Render with a visible browser window
        #[arg(long)]
        visible: bool,

        /// Do not send alerts even if Telegram is configured
        #[arg(long)]
        no_alerts: bool,
    },

    /// Show a saved product file
    #[command(alias = "v")]
    Show {
        /// Product file (defaults to the configured output)
        input: Option<PathBuf>,

        /// Words that must appear in the name
        #[arg(short, long)]
        search: Option<String>,

        /// Words excluded from the name (comma-separated)
        #[arg(long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Minimum discount percentage (e.g. 30 or 50)
        #[arg(long)]
        min_discount: Option<f64>,

        /// Minimum current price
        #[arg(long)]
        min_price: Option<f64>,

        /// Maximum current price
        #[arg(long)]
        max_price: Option<f64>,

        /// Only show spectacular deals
        #[arg(long)]
        spectacular: bool,

        /// Print totals instead of the product list
        #[arg(long)]
        summary: bool,
    },

    /// List known shop sites
    Sites,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }

    match cli.command {
        Commands::Scrape { url, output, threshold, proxy, visible, no_alerts } => {
            if let Some(url) = url {
                config.listing_url = url;
            }
            if let Some(output) = output {
                config.output = output;
            }
            if let Some(threshold) = threshold {
                config.spectacular_threshold = threshold;
            }
            if let Some(proxy) = proxy {
                config.proxy = Some(proxy);
            }
            if visible {
                config.headless = false;
            }
            if no_alerts {
                config.telegram = Default::default();
            }

            let cmd = ScrapeCommand::new(config);
            let output = cmd.execute().await?;
            println!("{}", output);
        }

        Commands::Show {
            input,
            search,
            exclude,
            min_discount,
            min_price,
            max_price,
            spectacular,
            summary,
        } => {
            let options = ShowOptions {
                search,
                exclude: exclude.unwrap_or_default(),
                min_discount,
                min_price,
                max_price,
                spectacular,
                summary,
            };

            let cmd = ShowCommand::new(config);
            let output = cmd.execute(input, &options)?;
            println!("{}", output);
        }

        Commands::Sites => {
            println!("Known shop sites:\n");
            println!("{:<12} {:<20}", "Code", "Domain");
            println!("{:-<12} {:-<20}", "", "");

            for site in Site::all() {
                println!("{:<12} {:<20}", site.to_string(), site.domain());
            }
        }
    }

    Ok(())
}
