//! Row-count stabilization policy.
//!
//! Lazily-loaded tables keep growing while pagination is clicked; a tab only
//! counts as fully captured once the row count holds steady across a
//! configured number of consecutive polls. The whole policy is pure so it can
//! be tested without a browser, and every threshold is a config parameter.

use std::time::Duration;
use tickersheet_common::config::ScrapeConfig;

/// Tunable polling thresholds for one tab.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Delay between polls.
    pub interval_ms: u64,
    /// Poll budget; exceeding it means the table never stabilized.
    pub max_polls: u32,
    /// Consecutive unchanged counts required to call the table stable.
    pub stable_polls: u32,
}

impl PollPolicy {
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            interval_ms: config.poll_interval_ms,
            max_polls: config.max_polls,
            stable_polls: config.stable_polls.max(1),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_config(&ScrapeConfig::default())
    }
}

/// Verdict after observing one row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    /// Count held steady long enough; extract now.
    Stable,
    /// Still changing (or not observed often enough); keep polling.
    Pending,
    /// Poll budget spent without stabilizing; extract partial data.
    Exhausted,
}

/// Tracks consecutive unchanged row counts against a [`PollPolicy`].
#[derive(Debug)]
pub struct RowCountTracker {
    max_polls: u32,
    stable_polls: u32,
    last_count: Option<u32>,
    streak: u32,
    polls: u32,
}

impl RowCountTracker {
    pub fn new(policy: &PollPolicy) -> Self {
        Self {
            max_polls: policy.max_polls,
            stable_polls: policy.stable_polls.max(1),
            last_count: None,
            streak: 0,
            polls: 0,
        }
    }

    /// Feed one observed row count and get the verdict.
    pub fn observe(&mut self, count: u32) -> Stability {
        self.polls += 1;

        match self.last_count {
            Some(last) if last == count => self.streak += 1,
            _ => self.streak = 0,
        }
        self.last_count = Some(count);

        if self.streak >= self.stable_polls {
            Stability::Stable
        } else if self.polls >= self.max_polls {
            Stability::Exhausted
        } else {
            Stability::Pending
        }
    }

    /// Number of polls consumed so far.
    pub fn polls(&self) -> u32 {
        self.polls
    }
}
