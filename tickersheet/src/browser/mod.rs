//! Browser control: Chromium session and per-ticker page navigation.

mod navigator;
mod tab;

pub use navigator::{BrowserSession, TickerPage};
pub use tab::Tab;
