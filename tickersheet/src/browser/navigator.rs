//! Chromium session management and ticker page navigation.
//!
//! Wraps chromiumoxide: one `BrowserSession` per run, one `TickerPage` per
//! ticker, tabs clicked in the fixed order on the same page.

use crate::error::ScrapeError;
use crate::extract::{PollPolicy, RawTable, RowCountTracker, Stability, TabSnapshot};
use crate::pipeline::{PageSource, TickerTabs};
use crate::Tab;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tickersheet_common::Config;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Delay after the initial page navigation before touching the DOM.
const PAGE_SETTLE: Duration = Duration::from_secs(3);

/// Delay after a tab click before counting rows.
const TAB_SETTLE: Duration = Duration::from_millis(1500);

/// User agent presented to the site.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Chromium launch arguments: container hardening plus the user agent.
fn chrome_args() -> Vec<String> {
    vec![
        "--disable-dev-shm-usage".to_string(),
        "--disable-setuid-sandbox".to_string(),
        format!("--user-agent={USER_AGENT}"),
    ]
}

/// Counts currently loaded table rows, preferring the site's selectable
/// rows container and falling back to any table body.
const JS_ROW_COUNT: &str = r#"() => {
    const rows = document.querySelectorAll('tbody[data-testid="selectable-rows-table-body"] tr.listRow');
    if (rows.length > 0) return rows.length;
    return document.querySelectorAll('table tbody tr').length;
}"#;

/// Finds a visible "Load More" pagination button, scrolls to it and clicks.
/// Returns whether a click happened.
const JS_CLICK_LOAD_MORE: &str = r#"() => {
    const buttons = Array.from(document.querySelectorAll('button'));
    const target = buttons.find(b => b.innerText.trim().startsWith('Load More') && b.offsetParent !== null);
    if (!target) return false;
    target.scrollIntoView({block: 'center'});
    target.click();
    return true;
}"#;

/// Extracts the visible tab's table: header names from `data-field`
/// attributes (innerText fallback) and one string array per row.
const JS_EXTRACT_TABLE: &str = r#"() => {
    const headers = [];
    document.querySelectorAll('table thead th').forEach(cell => {
        const field = cell.getAttribute('data-field');
        headers.push(field ? field : cell.innerText.trim());
    });
    const rows = [];
    let rowElements = document.querySelectorAll('tbody[data-testid="selectable-rows-table-body"] tr.listRow');
    if (rowElements.length === 0) {
        rowElements = document.querySelectorAll('table tbody tr');
    }
    rowElements.forEach(row => {
        const cells = [];
        row.querySelectorAll('td, th').forEach(cell => cells.push(cell.innerText.trim()));
        if (cells.length > 0) rows.push(cells);
    });
    return { headers, rows };
}"#;

/// Reads the ticker name cell: symbol element plus company description when
/// the site renders them separately, page heading otherwise.
const JS_TICKER_CELL: &str = r#"() => {
    const symbol = document.querySelector('[class*="tickerNameBox"]');
    const desc = document.querySelector('[class*="tickerDescription"]');
    if (symbol && desc) {
        return symbol.innerText.trim() + '\n' + desc.innerText.trim();
    }
    const heading = document.querySelector('h1');
    return heading ? heading.innerText.trim() : '';
}"#;

/// A launched Chromium instance shared by all ticker tasks.
///
/// The CDP event handler is drained on its own tokio task for the lifetime
/// of the session.
pub struct BrowserSession {
    browser: Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
    config: Config,
}

impl BrowserSession {
    /// Launch headless Chromium with the run's configuration.
    pub async fn launch(config: &Config) -> Result<Self, ScrapeError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .args(chrome_args());
        if !config.scrape.headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(ScrapeError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScrapeError::Launch(e.to_string()))?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        debug!(headless = config.scrape.headless, "Browser launched");

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler: Mutex::new(Some(handle)),
            config: config.clone(),
        })
    }

    /// Open a new page at the ticker's data page URL.
    pub async fn open_ticker(&self, symbol: &str) -> Result<TickerPage, ScrapeError> {
        let url = self.config.ticker_url(symbol);
        let nav_timeout = Duration::from_millis(self.config.scrape.nav_timeout_ms);

        let page = {
            let guard = self.browser.lock().await;
            let browser = guard.as_ref().ok_or_else(|| ScrapeError::Navigation {
                symbol: symbol.to_string(),
                reason: "browser session already closed".to_string(),
            })?;
            tokio::time::timeout(nav_timeout, browser.new_page(url.as_str()))
                .await
                .map_err(|_| ScrapeError::Navigation {
                    symbol: symbol.to_string(),
                    reason: format!("page load timed out after {:?}", nav_timeout),
                })?
                .map_err(|e| ScrapeError::Navigation {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                })?
        };

        let wait = tokio::time::timeout(nav_timeout, page.wait_for_navigation()).await;
        match wait {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(ScrapeError::Navigation {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ScrapeError::Navigation {
                    symbol: symbol.to_string(),
                    reason: format!("navigation timed out after {:?}", nav_timeout),
                })
            }
        }
        tokio::time::sleep(PAGE_SETTLE).await;

        debug!(symbol = %symbol, url = %url, "Ticker page opened");

        Ok(TickerPage {
            page,
            symbol: symbol.to_string(),
            nav_timeout,
            policy: PollPolicy::from_config(&self.config.scrape),
        })
    }

    /// Close the browser and stop the CDP handler task.
    pub async fn shutdown(&self) {
        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(e) = browser.close().await {
                warn!("Error closing browser: {e}");
            }
            let _ = browser.wait().await;
        }
        if let Some(handle) = self.handler.lock().await.take() {
            handle.abort();
        }
        debug!("Browser session closed");
    }
}

#[async_trait]
impl PageSource for BrowserSession {
    async fn open(&self, symbol: &str) -> Result<Box<dyn TickerTabs>, ScrapeError> {
        let page = self.open_ticker(symbol).await?;
        Ok(Box::new(page))
    }
}

/// One open browser page, pinned to a single ticker for its tab sweep.
pub struct TickerPage {
    page: Page,
    symbol: String,
    nav_timeout: Duration,
    policy: PollPolicy,
}

impl TickerPage {
    /// Click the tab's button and wait for its content to settle.
    pub async fn goto_tab(&self, tab: Tab) -> Result<(), ScrapeError> {
        let selector = format!("button#{}", tab.button_id());
        let nav_err = |reason: String| ScrapeError::Navigation {
            symbol: self.symbol.clone(),
            reason: format!("tab {}: {}", tab.name(), reason),
        };

        let element = tokio::time::timeout(self.nav_timeout, self.page.find_element(selector))
            .await
            .map_err(|_| nav_err("tab button lookup timed out".to_string()))?
            .map_err(|e| nav_err(e.to_string()))?;
        element
            .scroll_into_view()
            .await
            .map_err(|e| nav_err(e.to_string()))?;
        element.click().await.map_err(|e| nav_err(e.to_string()))?;
        tokio::time::sleep(TAB_SETTLE).await;
        Ok(())
    }

    /// Collect the tab's table once the row count stabilizes, clicking
    /// pagination controls between polls.
    ///
    /// Exhausting the poll budget is logged as incomplete data and yields a
    /// partial snapshot rather than failing the tab.
    pub async fn collect_tab(&self, tab: Tab) -> Result<TabSnapshot, ScrapeError> {
        self.goto_tab(tab).await?;

        let mut tracker = RowCountTracker::new(&self.policy);
        let complete = loop {
            let count = self.row_count().await?;
            match tracker.observe(count) {
                Stability::Stable => break true,
                Stability::Exhausted => break false,
                Stability::Pending => {}
            }
            if self.click_load_more().await? {
                debug!(symbol = %self.symbol, tab = %tab, rows = count, "Clicked Load More");
            }
            tokio::time::sleep(self.policy.interval()).await;
        };

        if !complete {
            let err = ScrapeError::IncompleteData {
                symbol: self.symbol.clone(),
                tab: tab.name(),
                polls: tracker.polls(),
            };
            warn!(symbol = %self.symbol, tab = %tab, "{err}; keeping partial rows");
        }

        let raw: RawTable = self.evaluate(JS_EXTRACT_TABLE, "table extraction").await?;
        Ok(TabSnapshot::from_raw(tab, raw, complete))
    }

    /// Raw text of the page's ticker name cell ("AAPL\nApple Inc.").
    pub async fn ticker_cell(&self) -> Result<String, ScrapeError> {
        self.evaluate(JS_TICKER_CELL, "ticker cell read").await
    }

    async fn row_count(&self) -> Result<u32, ScrapeError> {
        self.evaluate(JS_ROW_COUNT, "row count").await
    }

    async fn click_load_more(&self) -> Result<bool, ScrapeError> {
        self.evaluate(JS_CLICK_LOAD_MORE, "pagination click").await
    }

    /// Close the page's browser target. Dropping a page does not release it;
    /// the sweep must close explicitly or the tab stays open until shutdown.
    pub async fn close(&self) -> Result<(), ScrapeError> {
        let nav_err = |reason: String| ScrapeError::Navigation {
            symbol: self.symbol.clone(),
            reason: format!("page close: {reason}"),
        };
        tokio::time::timeout(self.nav_timeout, self.page.clone().close())
            .await
            .map_err(|_| nav_err("timed out".to_string()))?
            .map_err(|e| nav_err(e.to_string()))?;
        Ok(())
    }

    /// Run an injected JS function and deserialize its return value,
    /// bounded by the navigation timeout.
    async fn evaluate<T: DeserializeOwned>(
        &self,
        js: &str,
        what: &str,
    ) -> Result<T, ScrapeError> {
        let nav_err = |reason: String| ScrapeError::Navigation {
            symbol: self.symbol.clone(),
            reason: format!("{what}: {reason}"),
        };
        let result = tokio::time::timeout(self.nav_timeout, self.page.evaluate_function(js))
            .await
            .map_err(|_| nav_err("evaluation timed out".to_string()))?
            .map_err(|e| nav_err(e.to_string()))?;
        result.into_value().map_err(|e| nav_err(e.to_string()))
    }
}

#[async_trait]
impl TickerTabs for TickerPage {
    async fn ticker_cell(&mut self) -> Result<String, ScrapeError> {
        TickerPage::ticker_cell(self).await
    }

    async fn snapshot(&mut self, tab: Tab) -> Result<TabSnapshot, ScrapeError> {
        self.collect_tab(tab).await
    }

    async fn close(&mut self) -> Result<(), ScrapeError> {
        TickerPage::close(self).await
    }
}
