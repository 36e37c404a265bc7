//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::deals::discount::SPECTACULAR_THRESHOLD;
use crate::deals::selectors::SelectorConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listing page to extract
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Output file for the product records
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Run the renderer without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Minimum discount percentage for a spectacular deal
    #[serde(default = "default_threshold")]
    pub spectacular_threshold: f64,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Page load budget in milliseconds
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// How long to wait for product cards in milliseconds
    #[serde(default = "default_selector_timeout_ms")]
    pub selector_timeout_ms: u64,

    /// How long to look for a cookie banner in milliseconds
    #[serde(default = "default_cookie_banner_timeout_ms")]
    pub cookie_banner_timeout_ms: u64,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Alert channel credentials
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Card and field selectors
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// Telegram bot credentials. Alerts are disabled unless both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,

    #[serde(default)]
    pub chat_id: Option<String>,
}

impl TelegramConfig {
    /// Returns (token, chat id) when both are present and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let token = self.bot_token.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let chat_id = self.chat_id.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((token, chat_id))
    }
}

fn default_listing_url() -> String {
    "https://shop.asus.com/us/all-in-one-pcs".to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("products.json")
}

fn default_headless() -> bool {
    true
}

fn default_threshold() -> f64 {
    SPECTACULAR_THRESHOLD
}

fn default_navigation_timeout_ms() -> u64 {
    60_000
}

fn default_selector_timeout_ms() -> u64 {
    30_000
}

fn default_cookie_banner_timeout_ms() -> u64 {
    3_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            output: default_output(),
            headless: default_headless(),
            spectacular_threshold: default_threshold(),
            proxy: None,
            navigation_timeout_ms: default_navigation_timeout_ms(),
            selector_timeout_ms: default_selector_timeout_ms(),
            cookie_banner_timeout_ms: default_cookie_banner_timeout_ms(),
            format: OutputFormat::Table,
            telegram: TelegramConfig::default(),
            selectors: SelectorConfig::default(),
        }
    }
}

/// Parses a boolean environment value.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("deal-hound").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("DEAL_HOUND_URL") {
            self.listing_url = url;
        }

        if let Ok(output) = std::env::var("DEAL_HOUND_OUTPUT") {
            self.output = PathBuf::from(output);
        }

        if let Ok(headless) = std::env::var("DEAL_HOUND_HEADLESS") {
            if let Some(h) = parse_flag(&headless) {
                self.headless = h;
            }
        }

        if let Ok(threshold) = std::env::var("DEAL_HOUND_THRESHOLD") {
            if let Ok(t) = threshold.parse() {
                self.spectacular_threshold = t;
            }
        }

        if let Ok(proxy) = std::env::var("DEAL_HOUND_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }

        if let Ok(chat_id) = std::env::var("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = Some(chat_id);
        }

        self
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    const ENV_VARS: &[&str] = &[
        "DEAL_HOUND_URL",
        "DEAL_HOUND_OUTPUT",
        "DEAL_HOUND_HEADLESS",
        "DEAL_HOUND_THRESHOLD",
        "DEAL_HOUND_PROXY",
        "TELEGRAM_BOT_TOKEN",
        "TELEGRAM_CHAT_ID",
    ];

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Runs `f` with the given variables set, restoring the environment afterwards.
    fn with_vars(vars: &[(&str, &str)], f: impl FnOnce()) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved: Vec<_> = ENV_VARS.iter().map(|k| (*k, std::env::var(k).ok())).collect();
        for key in ENV_VARS {
            std::env::remove_var(key);
        }
        for (key, value) in vars {
            std::env::set_var(key, value);
        }

        f();

        for (key, value) in saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.listing_url, "https://shop.asus.com/us/all-in-one-pcs");
        assert_eq!(config.output, PathBuf::from("products.json"));
        assert!(config.headless);
        assert_eq!(config.spectacular_threshold, 60.0);
        assert_eq!(config.navigation_timeout_ms, 60_000);
        assert_eq!(config.selector_timeout_ms, 30_000);
        assert_eq!(config.cookie_banner_timeout_ms, 3_000);
        assert_eq!(config.format, OutputFormat::Table);
        assert!(config.proxy.is_none());
        assert!(config.telegram.credentials().is_none());
        assert_eq!(config.selectors, SelectorConfig::default());
    }

    #[test]
    fn test_telegram_credentials() {
        let telegram = TelegramConfig {
            bot_token: Some("123:abc".to_string()),
            chat_id: Some("-100".to_string()),
        };
        assert_eq!(telegram.credentials(), Some(("123:abc", "-100")));

        let missing_chat = TelegramConfig { chat_id: None, ..telegram.clone() };
        assert!(missing_chat.credentials().is_none());

        let empty_token = TelegramConfig { bot_token: Some("  ".to_string()), ..telegram };
        assert!(empty_token.credentials().is_none());
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);

        let err = "invalid".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
        assert!(err.contains("table, json, markdown, csv"));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Markdown.to_string(), "markdown");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            listing_url = "https://rog.asus.com/us/desktops"
            output = "/tmp/deals.json"
            headless = false
            spectacular_threshold = 50.0
            format = "json"

            [telegram]
            bot_token = "123:abc"
            chat_id = "42"

            [selectors]
            name = [".tile-title"]
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.listing_url, "https://rog.asus.com/us/desktops");
        assert_eq!(config.output, PathBuf::from("/tmp/deals.json"));
        assert!(!config.headless);
        assert_eq!(config.spectacular_threshold, 50.0);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.telegram.credentials(), Some(("123:abc", "42")));
        assert_eq!(config.selectors.name, vec![".tile-title"]);
        // Unset selector lists keep their defaults
        assert_eq!(config.selectors.cards, SelectorConfig::default().cards);
        assert_eq!(config.navigation_timeout_ms, 60_000);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            spectacular_threshold = 70.0
            selector_timeout_ms = 5000
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.spectacular_threshold, 70.0);
        assert_eq!(config.selector_timeout_ms, 5000);
    }

    #[test]
    fn test_config_from_file_not_found() {
        let err = Config::from_file("/nonexistent/path/config.toml").unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let err = Config::from_file(file.path()).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"output = "aio.json""#).unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.output, PathBuf::from("aio.json"));
    }

    #[test]
    fn test_config_with_env() {
        with_vars(
            &[
                ("DEAL_HOUND_URL", "https://estore.asus.com/deals"),
                ("DEAL_HOUND_OUTPUT", "out.json"),
                ("DEAL_HOUND_HEADLESS", "false"),
                ("DEAL_HOUND_THRESHOLD", "45.5"),
                ("TELEGRAM_BOT_TOKEN", "token"),
                ("TELEGRAM_CHAT_ID", "chat"),
            ],
            || {
                let config = Config::new().with_env();
                assert_eq!(config.listing_url, "https://estore.asus.com/deals");
                assert_eq!(config.output, PathBuf::from("out.json"));
                assert!(!config.headless);
                assert_eq!(config.spectacular_threshold, 45.5);
                assert_eq!(config.telegram.credentials(), Some(("token", "chat")));
            },
        );
    }

    #[test]
    fn test_config_with_env_invalid_values() {
        with_vars(
            &[("DEAL_HOUND_HEADLESS", "maybe"), ("DEAL_HOUND_THRESHOLD", "lots")],
            || {
                let config = Config::new().with_env();
                // Invalid values should be ignored, keeping defaults
                assert!(config.headless);
                assert_eq!(config.spectacular_threshold, 60.0);
            },
        );
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("sometimes"), None);
    }
}
