//! Logging setup for the tickersheet pipeline.
//!
//! # Noise Filtering
//!
//! Noisy library modules (the CDP client and its transport stack) are set to
//! `warn` by default so scrape progress stays readable at `info`.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Modules filtered to `warn` level by default.
///
/// chromiumoxide logs every CDP frame at debug/trace; the websocket and HTTP
/// layers underneath it are similarly chatty.
pub const NOISY_MODULES: &[&str] = &[
    "chromiumoxide",
    "chromiumoxide_cdp",
    "tungstenite",
    "hyper",
    "h2",
    "rustls",
    "tokio_util",
];

/// Build the default EnvFilter with noise suppression.
///
/// `RUST_LOG` overrides everything when set.
fn build_filter(log_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let mut directives = String::from(log_level);
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{}=warn", module));
    }

    EnvFilter::new(&directives)
}

/// Initialize logging with the given configuration.
///
/// # Arguments
///
/// * `log_level` - Base log level (trace, debug, info, warn, error)
/// * `log_format` - "json" for structured JSON, anything else for pretty output
pub fn init_logging(log_level: &str, log_format: &str) {
    let filter = build_filter(log_level);
    let subscriber = tracing_subscriber::registry().with(filter);

    if log_format == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true);
        let _ = subscriber.with(fmt_layer).try_init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(true)
            .with_file(false)
            .with_line_number(false);
        let _ = subscriber.with(fmt_layer).try_init();
    }

    tracing::debug!(
        log_level = %log_level,
        log_format = %log_format,
        noise_filtered = NOISY_MODULES.len(),
        "Logging initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noisy_modules_list() {
        assert!(NOISY_MODULES.contains(&"chromiumoxide"));
        assert!(NOISY_MODULES.contains(&"tungstenite"));
        assert!(NOISY_MODULES.contains(&"hyper"));
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        // try_init tolerates an already-installed subscriber
        init_logging("debug", "pretty");
        init_logging("info", "json");
    }
}
