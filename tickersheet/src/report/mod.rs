//! Report assembly: accumulation, pivot and workbook output.

mod dataset;
mod workbook;

pub use dataset::{
    Column, ColumnKind, NormalizedRow, Pivot, ReportDataset, SheetData, SheetRow, TickerRecord,
};
pub use workbook::write_report;
