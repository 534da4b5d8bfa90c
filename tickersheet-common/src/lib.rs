//! tickersheet-common - Shared configuration and logging for the tickersheet pipeline.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod logging;

pub use config::Config;
pub use logging::init_logging;
