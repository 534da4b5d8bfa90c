//! tickersheet - Headless-browser scraper for per-ticker financial tables.
//!
//! Drives Chromium over CDP to visit each ticker's data page, walks the data
//! tabs in a fixed order, normalizes the raw table text into typed values,
//! and writes one styled workbook at the end of the run.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod browser;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod retry;

pub use browser::{BrowserSession, Tab};
pub use error::ScrapeError;
pub use extract::{PollPolicy, RawTable, RowCountTracker, Stability, TabSnapshot};
pub use normalize::{normalize_snapshot, parse_field, split_ticker_cell, Value};
pub use pipeline::{collect, run, PageSource, RunSummary, TickerOutcome, TickerTabs};
pub use report::{ColumnKind, NormalizedRow, ReportDataset, TickerRecord};
pub use retry::RetryPolicy;
