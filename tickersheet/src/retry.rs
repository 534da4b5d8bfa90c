//! Bounded retry policy for tab navigation.
//!
//! Replaces implicit reload loops with an explicit attempt count and backoff
//! that can be tested away from the browser.

use std::time::Duration;
use tickersheet_common::config::ScrapeConfig;

/// Attempt budget and backoff for one retried operation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// `attempts` includes the first try; a floor of one is enforced.
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::new(
            config.retry_attempts,
            Duration::from_millis(config.retry_backoff_ms),
        )
    }

    /// Total attempts allowed (first try plus retries).
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay to wait before the given attempt (1-based); `None` for the
    /// first attempt.
    pub fn backoff_before(&self, attempt: u32) -> Option<Duration> {
        (attempt > 1).then_some(self.backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ScrapeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_floor() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.attempts(), 1);
    }

    #[test]
    fn test_no_backoff_before_first_attempt() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1500));
        assert_eq!(policy.backoff_before(1), None);
        assert_eq!(policy.backoff_before(2), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_default_is_single_retry() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 2);
    }
}
