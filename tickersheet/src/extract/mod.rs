//! Table extraction: raw DOM tables and row-count stabilization.

mod stabilize;
mod table;

pub use stabilize::{PollPolicy, RowCountTracker, Stability};
pub use table::{RawTable, TabSnapshot};
