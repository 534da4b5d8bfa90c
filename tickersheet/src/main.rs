//! tickersheet entry point.

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tickersheet::{run, BrowserSession, PageSource};
use tickersheet_common::config::Config;
use tickersheet_common::logging::init_logging;

/// Scrape per-ticker financial tabs into a styled spreadsheet.
#[derive(Parser, Debug)]
#[command(name = "tickersheet")]
#[command(version = "0.1.0")]
#[command(about = "Headless-browser scraper for per-ticker financial tables", long_about = None)]
struct Cli {
    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ticker symbol to scrape (repeatable)
    #[arg(short = 't', long = "ticker")]
    tickers: Vec<String>,

    /// File with one ticker symbol per line
    #[arg(long)]
    tickers_file: Option<PathBuf>,

    /// Output workbook path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run the browser with a visible window
    #[arg(long)]
    headed: bool,

    /// Maximum simultaneously open ticker pages
    #[arg(long)]
    concurrency: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if !cli.tickers.is_empty() {
        config.site.tickers.extend(cli.tickers.iter().cloned());
    }
    if let Some(path) = cli.tickers_file {
        config.site.tickers_file = Some(path);
    }
    if let Some(path) = cli.output {
        config.output.path = path;
    }
    if cli.headed {
        config.scrape.headless = false;
    }
    if let Some(concurrency) = cli.concurrency {
        config.scrape.concurrency = concurrency;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );
    tracing::info!("tickersheet v{}", env!("CARGO_PKG_VERSION"));

    let tickers = config.resolve_tickers()?;
    if tickers.is_empty() {
        bail!("no tickers to scrape; pass --ticker or set site.tickers in the config");
    }
    tracing::info!(count = tickers.len(), "Resolved ticker list");

    let session = Arc::new(BrowserSession::launch(&config).await?);
    let source: Arc<dyn PageSource> = session.clone();

    let result = run(&config, &tickers, source).await;
    session.shutdown().await;

    let summary = result?;
    println!("{summary}");
    for (symbol, reason) in &summary.failed {
        println!("  failed {symbol}: {reason}");
    }

    // Skipped tickers are not fatal; only a write failure would have
    // propagated above
    Ok(())
}
