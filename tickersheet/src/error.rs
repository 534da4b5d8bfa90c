//! Error types for tickersheet.
//!
//! The taxonomy follows the recovery boundary of each failure:
//! per-ticker (`Navigation`), per-tab (`IncompleteData`), per-field (`Parse`),
//! and run-fatal (`Launch`, `Write`).

use std::path::PathBuf;

/// Scrape pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation failed for {symbol}: {reason}")]
    Navigation { symbol: String, reason: String },

    #[error("Table on {tab} for {symbol} did not stabilize within {polls} polls")]
    IncompleteData {
        symbol: String,
        tab: &'static str,
        polls: u32,
    },

    #[error("Cannot parse field {field:?}: {raw:?}")]
    Parse { field: String, raw: String },

    #[error("Failed to write report to {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
}

impl ScrapeError {
    /// Fatal errors abort the run; everything else is handled at its local
    /// boundary (skip ticker, keep partial row, mark field missing).
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScrapeError::Launch(_) | ScrapeError::Write { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScrapeError::Navigation {
            symbol: "ZZZZ".to_string(),
            reason: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "Navigation failed for ZZZZ: timeout");
    }

    #[test]
    fn test_fatality() {
        assert!(ScrapeError::Launch("no chrome".into()).is_fatal());
        assert!(ScrapeError::Write {
            path: PathBuf::from("out.xlsx"),
            reason: "permission denied".into(),
        }
        .is_fatal());
        assert!(!ScrapeError::Parse {
            field: "P/E".into(),
            raw: "abc".into(),
        }
        .is_fatal());
        assert!(!ScrapeError::IncompleteData {
            symbol: "AAPL".into(),
            tab: "Overview",
            polls: 150,
        }
        .is_fatal());
    }
}
