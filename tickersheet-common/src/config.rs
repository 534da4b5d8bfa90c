//! Configuration for the tickersheet pipeline.
//!
//! Configuration lives in a single JSON file. Resolution order:
//!
//! 1. Explicit path passed on the command line
//! 2. `TICKERSHEET_CONFIG` environment variable
//! 3. Built-in defaults (no file required)
//!
//! Every field carries a serde default so a partial file only needs to name
//! the sections it overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "TICKERSHEET_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Target site: where ticker pages live and which tickers to visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// URL template for a ticker's data page. `{symbol}` is substituted.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Literal list of ticker symbols to scrape.
    #[serde(default)]
    pub tickers: Vec<String>,

    /// Optional file with one ticker symbol per line (`#` comments allowed).
    /// Merged after the literal list, duplicates dropped.
    #[serde(default)]
    pub tickers_file: Option<PathBuf>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            tickers: Vec::new(),
            tickers_file: None,
        }
    }
}

fn default_base_url() -> String {
    "https://www.tradingview.com/symbols/{symbol}/".into()
}

/// Browser and extraction tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Run the browser without a visible window.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Maximum number of simultaneously open ticker pages.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Timeout for a single page navigation or tab click, in milliseconds.
    #[serde(default = "default_nav_timeout_ms")]
    pub nav_timeout_ms: u64,

    /// Hard ceiling for one ticker's full tab sweep, in milliseconds.
    /// On expiry the ticker's partial results are discarded.
    #[serde(default = "default_ticker_timeout_ms")]
    pub ticker_timeout_ms: u64,

    /// Delay between row-count polls while a table is still loading.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum row-count polls (and "Load More" clicks) per tab.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,

    /// Consecutive polls with an unchanged row count before the table
    /// counts as fully loaded.
    #[serde(default = "default_stable_polls")]
    pub stable_polls: u32,

    /// Navigation attempts per tab (first try plus retries).
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Delay before a retried tab navigation, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            concurrency: default_concurrency(),
            nav_timeout_ms: default_nav_timeout_ms(),
            ticker_timeout_ms: default_ticker_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
            stable_polls: default_stable_polls(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_headless() -> bool {
    true
}

fn default_concurrency() -> usize {
    2
}

fn default_nav_timeout_ms() -> u64 {
    60_000
}

fn default_ticker_timeout_ms() -> u64 {
    180_000
}

fn default_poll_interval_ms() -> u64 {
    800
}

fn default_max_polls() -> u32 {
    150
}

fn default_stable_polls() -> u32 {
    2
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1_500
}

/// Output file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Destination for the generated workbook.
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("tickersheet.xlsx")
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Base log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format: "pretty" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

impl Config {
    /// Load configuration, falling back to defaults when no file is present.
    ///
    /// Checks `TICKERSHEET_CONFIG` for an explicit path; a path named there
    /// must exist and parse.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load_from(Path::new(&path));
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the full ticker list: literal entries first, then the tickers
    /// file, duplicates and blank lines dropped, symbols upper-cased.
    pub fn resolve_tickers(&self) -> Result<Vec<String>> {
        let mut seen = std::collections::HashSet::new();
        let mut tickers = Vec::new();

        let mut push = |raw: &str| {
            let symbol = raw.trim().to_uppercase();
            if !symbol.is_empty() && seen.insert(symbol.clone()) {
                tickers.push(symbol);
            }
        };

        for symbol in &self.site.tickers {
            push(symbol);
        }

        if let Some(ref path) = self.site.tickers_file {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading tickers file {}", path.display()))?;
            for line in raw.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                push(line);
            }
        }

        Ok(tickers)
    }

    /// Build the page URL for a ticker symbol.
    pub fn ticker_url(&self, symbol: &str) -> String {
        self.site.base_url.replace("{symbol}", symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.scrape.headless);
        assert_eq!(config.scrape.concurrency, 2);
        assert_eq!(config.scrape.stable_polls, 2);
        assert_eq!(config.output.path, PathBuf::from("tickersheet.xlsx"));
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"site": {"tickers": ["aapl", "msft"]}, "scrape": {"concurrency": 4}}"#,
        )
        .unwrap();
        assert_eq!(config.site.tickers, vec!["aapl", "msft"]);
        assert_eq!(config.scrape.concurrency, 4);
        // Untouched sections fall back to defaults
        assert_eq!(config.scrape.max_polls, 150);
        assert!(config.site.base_url.contains("{symbol}"));
    }

    #[test]
    fn test_ticker_url_substitution() {
        let config = Config::default();
        assert_eq!(
            config.ticker_url("AAPL"),
            "https://www.tradingview.com/symbols/AAPL/"
        );
    }

    #[test]
    fn test_resolve_tickers_merges_and_dedupes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# watchlist").unwrap();
        writeln!(file, "msft").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "AAPL").unwrap();

        let mut config = Config::default();
        config.site.tickers = vec!["aapl".into(), "GOOG".into()];
        config.site.tickers_file = Some(file.path().to_path_buf());

        let tickers = config.resolve_tickers().unwrap();
        assert_eq!(tickers, vec!["AAPL", "GOOG", "MSFT"]);
    }

    #[test]
    fn test_load_from_missing_file_errors() {
        let result = Config::load_from(Path::new("/nonexistent/config.json"));
        assert!(result.is_err());
    }
}
