//! Pipeline orchestration: bounded-concurrency ticker sweeps into one
//! report dataset.
//!
//! Each ticker runs as its own task behind a semaphore; results come back
//! indexed by input position and are folded into the dataset by a single
//! owner, so the workbook's row order never depends on completion order.

use crate::browser::Tab;
use crate::error::ScrapeError;
use crate::extract::TabSnapshot;
use crate::normalize::{normalize_snapshot, split_ticker_cell};
use crate::report::{write_report, NormalizedRow, ReportDataset, TickerRecord};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tickersheet_common::Config;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Opens ticker pages. The browser implements this; tests substitute canned
/// snapshots.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn open(&self, symbol: &str) -> Result<Box<dyn TickerTabs>, ScrapeError>;
}

/// One ticker's open page: its name cell and tab snapshots.
///
/// `close` releases the page's browser tab; the pipeline calls it after every
/// sweep so open pages never outlive their ticker.
#[async_trait]
pub trait TickerTabs: Send {
    async fn ticker_cell(&mut self) -> Result<String, ScrapeError>;
    async fn snapshot(&mut self, tab: Tab) -> Result<TabSnapshot, ScrapeError>;
    async fn close(&mut self) -> Result<(), ScrapeError>;
}

/// Final disposition of one ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickerOutcome {
    /// Every tab captured completely.
    Full,
    /// At least one tab incomplete or skipped.
    Partial,
    /// No usable data; the reason is logged and summarized.
    Failed(String),
}

/// Run totals reported to the user at the end.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub full: usize,
    pub partial: usize,
    pub failed: Vec<(String, String)>,
}

impl RunSummary {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn total(&self) -> usize {
        self.full + self.partial + self.failed.len()
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} tickers: {} full, {} partial, {} failed",
            self.total(),
            self.full,
            self.partial,
            self.failed.len()
        )?;
        if !self.failed.is_empty() {
            let symbols: Vec<&str> = self.failed.iter().map(|(s, _)| s.as_str()).collect();
            write!(f, " ({})", symbols.join(", "))?;
        }
        Ok(())
    }
}

struct TickerResult {
    outcome: TickerOutcome,
    rows: Vec<NormalizedRow>,
}

impl TickerResult {
    fn failed(reason: impl Into<String>) -> Self {
        Self {
            outcome: TickerOutcome::Failed(reason.into()),
            rows: Vec::new(),
        }
    }
}

/// Scrape every ticker and write the workbook.
///
/// Per-ticker failures are absorbed into the summary; only a fatal write
/// error propagates.
pub async fn run(
    config: &Config,
    tickers: &[String],
    source: Arc<dyn PageSource>,
) -> Result<RunSummary, ScrapeError> {
    let start = Instant::now();
    let (dataset, summary) = collect(config, tickers, source).await;

    write_report(&dataset, &config.output.path)?;

    info!(
        elapsed_s = start.elapsed().as_secs(),
        rows = dataset.len(),
        %summary,
        "Run complete"
    );
    Ok(summary)
}

/// Scrape every ticker into a dataset without writing the workbook.
pub async fn collect(
    config: &Config,
    tickers: &[String],
    source: Arc<dyn PageSource>,
) -> (ReportDataset, RunSummary) {
    let concurrency = config.scrape.concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let ticker_timeout = Duration::from_millis(config.scrape.ticker_timeout_ms);
    let retry = RetryPolicy::from_config(&config.scrape);

    let mut tasks: JoinSet<(usize, TickerResult)> = JoinSet::new();
    for (idx, symbol) in tickers.iter().enumerate() {
        let source = Arc::clone(&source);
        let semaphore = Arc::clone(&semaphore);
        let symbol = symbol.clone();

        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (idx, TickerResult::failed("scheduler shut down"));
            };
            let start = Instant::now();
            let result = scrape_ticker(&*source, &symbol, retry, ticker_timeout).await;
            debug!(
                symbol = %symbol,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Ticker finished"
            );
            (idx, result)
        });
    }

    // Single owner folds results back in input order
    let mut slots: Vec<Option<TickerResult>> = Vec::new();
    slots.resize_with(tickers.len(), || None);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, result)) => slots[idx] = Some(result),
            Err(e) => error!("Ticker task panicked: {e}"),
        }
    }

    let mut dataset = ReportDataset::new();
    let mut summary = RunSummary::default();
    for (symbol, slot) in tickers.iter().zip(slots) {
        let result = slot.unwrap_or_else(|| TickerResult::failed("task panicked"));
        match result.outcome {
            TickerOutcome::Full => summary.full += 1,
            TickerOutcome::Partial => summary.partial += 1,
            TickerOutcome::Failed(reason) => {
                warn!(symbol = %symbol, reason = %reason, "Ticker failed");
                summary.failed.push((symbol.clone(), reason));
                continue;
            }
        }
        for row in result.rows {
            dataset.append(row);
        }
    }

    (dataset, summary)
}

/// One ticker's full sweep: open the page, run the tab walk under the
/// ticker budget, and close the page whatever the outcome.
async fn scrape_ticker(
    source: &dyn PageSource,
    symbol: &str,
    retry: RetryPolicy,
    budget: Duration,
) -> TickerResult {
    let mut page = match source.open(symbol).await {
        Ok(page) => page,
        Err(e) => return TickerResult::failed(e.to_string()),
    };

    // A timeout here drops the in-flight sweep: partial tab results for the
    // ticker are discarded, not merged
    let result = match tokio::time::timeout(budget, sweep_tabs(page.as_mut(), symbol, retry)).await
    {
        Ok(result) => result,
        Err(_) => {
            warn!(symbol = %symbol, "Ticker exceeded {:?}; discarding", budget);
            TickerResult::failed(format!("timed out after {:?}", budget))
        }
    };

    // Closing happens outside the budget so even a timed-out ticker releases
    // its browser tab
    if let Err(e) = page.close().await {
        debug!(symbol = %symbol, "Page close failed: {e}");
    }

    result
}

/// Read the name cell, then walk every tab in order, normalizing as we go.
async fn sweep_tabs(page: &mut dyn TickerTabs, symbol: &str, retry: RetryPolicy) -> TickerResult {
    let ticker = match page.ticker_cell().await {
        Ok(cell) => {
            let (parsed_symbol, company_name) = split_ticker_cell(&cell);
            if !parsed_symbol.is_empty() && parsed_symbol != symbol {
                debug!(symbol = %symbol, page_symbol = %parsed_symbol, "Page symbol differs");
            }
            TickerRecord {
                symbol: symbol.to_string(),
                company_name,
            }
        }
        Err(e) => {
            warn!(symbol = %symbol, "Ticker cell unreadable: {e}");
            TickerRecord {
                symbol: symbol.to_string(),
                company_name: String::new(),
            }
        }
    };

    let mut rows = Vec::new();
    let mut partial = false;
    for tab in Tab::ALL {
        match snapshot_with_retry(&mut *page, symbol, tab, retry).await {
            Ok(snapshot) => {
                if !snapshot.complete {
                    partial = true;
                }
                rows.push(normalize_snapshot(&ticker, &snapshot));
            }
            Err(e) => {
                warn!(symbol = %symbol, tab = %tab, "Tab skipped: {e}");
                partial = true;
            }
        }
    }

    if rows.is_empty() {
        return TickerResult::failed("no tab produced data");
    }

    let outcome = if partial {
        TickerOutcome::Partial
    } else {
        TickerOutcome::Full
    };
    TickerResult { outcome, rows }
}

/// Fetch one tab with the bounded retry policy (a single re-navigation by
/// default).
async fn snapshot_with_retry(
    page: &mut dyn TickerTabs,
    symbol: &str,
    tab: Tab,
    retry: RetryPolicy,
) -> Result<TabSnapshot, ScrapeError> {
    let mut last_err = None;
    for attempt in 1..=retry.attempts() {
        if let Some(backoff) = retry.backoff_before(attempt) {
            tokio::time::sleep(backoff).await;
        }
        match page.snapshot(tab).await {
            Ok(snapshot) => return Ok(snapshot),
            Err(e) => {
                warn!(
                    symbol = %symbol,
                    tab = %tab,
                    attempt,
                    attempts = retry.attempts(),
                    "Tab fetch failed: {e}"
                );
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or(ScrapeError::Navigation {
        symbol: symbol.to_string(),
        reason: "no attempts were made".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            full: 3,
            partial: 1,
            failed: vec![("ZZZZ".to_string(), "not found".to_string())],
        };
        assert_eq!(
            summary.to_string(),
            "5 tickers: 3 full, 1 partial, 1 failed (ZZZZ)"
        );
    }

    #[test]
    fn test_summary_counts() {
        let summary = RunSummary {
            full: 2,
            partial: 0,
            failed: vec![],
        };
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.failed_count(), 0);
    }
}
