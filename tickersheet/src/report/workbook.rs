//! Workbook rendering: the pivoted dataset into a styled xlsx file.
//!
//! The file is written to a temporary sibling path and renamed into place,
//! so a failed run never leaves a partially written report behind.

use crate::error::ScrapeError;
use crate::normalize::Value;
use crate::report::dataset::{ColumnKind, ReportDataset, SheetData};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet, XlsxError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Excel's sheet name limit.
const MAX_SHEET_NAME: usize = 31;

/// Header fill color (dark blue).
const HEADER_FILL: u32 = 0x1F4E78;

/// Header row height.
const HEADER_HEIGHT: f64 = 25.0;

/// Write the dataset to `path` as a styled workbook, atomically.
pub fn write_report(dataset: &ReportDataset, path: &Path) -> Result<(), ScrapeError> {
    let pivot = dataset.pivot();
    let write_err = |reason: String| ScrapeError::Write {
        path: path.to_path_buf(),
        reason,
    };

    let mut workbook = Workbook::new();

    if pivot.sheets.is_empty() {
        // A workbook needs at least one sheet even when every ticker failed
        let worksheet = workbook.add_worksheet();
        write_header(worksheet, &[]).map_err(|e| write_err(e.to_string()))?;
    }

    for sheet in &pivot.sheets {
        write_sheet(&mut workbook, sheet).map_err(|e| write_err(e.to_string()))?;
    }

    let tmp = tmp_path(path);
    if let Err(e) = workbook.save(&tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e.to_string()));
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e.to_string()));
    }

    info!(
        path = %path.display(),
        sheets = pivot.sheets.len(),
        "Report written"
    );
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "report.xlsx".into());
    name.push(".tmp");
    path.with_file_name(name)
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
}

fn write_header(worksheet: &mut Worksheet, names: &[String]) -> Result<(), XlsxError> {
    let format = header_format();
    worksheet.write_string_with_format(0, 0, "Ticker", &format)?;
    worksheet.write_string_with_format(0, 1, "Company Name", &format)?;
    for (idx, name) in names.iter().enumerate() {
        worksheet.write_string_with_format(0, (idx + 2) as u16, name, &format)?;
    }
    worksheet.set_row_height(0, HEADER_HEIGHT)?;
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_sheet(workbook: &mut Workbook, sheet: &SheetData) -> Result<(), XlsxError> {
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(truncate_sheet_name(sheet.tab.name()))?;

    let names: Vec<String> = sheet.columns.iter().map(|c| c.name.clone()).collect();
    write_header(worksheet, &names)?;

    let formats: Vec<Option<Format>> = sheet
        .columns
        .iter()
        .enumerate()
        .map(|(col, column)| column_format(column.kind, column_max_abs(sheet, col)))
        .collect();

    for (row_idx, row) in sheet.rows.iter().enumerate() {
        let r = (row_idx + 1) as u32;
        worksheet.write_string(r, 0, &row.ticker.symbol)?;
        worksheet.write_string(r, 1, &row.ticker.company_name)?;

        for (col_idx, value) in row.values.iter().enumerate() {
            let c = (col_idx + 2) as u16;
            match value {
                Value::Number(n) | Value::Percent(n) | Value::Currency(n) => {
                    match &formats[col_idx] {
                        Some(format) => worksheet.write_number_with_format(r, c, *n, format)?,
                        None => worksheet.write_number(r, c, *n)?,
                    };
                }
                Value::Text(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                // Missing values stay blank: never zero, never placeholder text
                Value::Missing => {}
            }
        }
    }

    let last_row = sheet.rows.len() as u32;
    let last_col = (sheet.columns.len() + 1) as u16;
    if last_row > 0 {
        worksheet.autofilter(0, 0, last_row, last_col)?;
    }
    worksheet.autofit();

    Ok(())
}

fn truncate_sheet_name(name: &str) -> String {
    name.chars().take(MAX_SHEET_NAME).collect()
}

/// Largest absolute numeric value in a column, for magnitude-scaled masks.
fn column_max_abs(sheet: &SheetData, col: usize) -> f64 {
    sheet
        .rows
        .iter()
        .filter_map(|row| row.values[col].as_f64())
        .fold(0.0, |acc, v| acc.max(v.abs()))
}

fn column_format(kind: ColumnKind, max_abs: f64) -> Option<Format> {
    let format = match kind {
        ColumnKind::Currency => Format::new()
            .set_num_format(currency_mask(max_abs))
            .set_align(FormatAlign::Right),
        ColumnKind::Percent => Format::new()
            .set_num_format("0.00%")
            .set_align(FormatAlign::Right),
        ColumnKind::Number => Format::new()
            .set_num_format("#,##0.00")
            .set_align(FormatAlign::Right),
        ColumnKind::Text => return None,
    };
    Some(format)
}

/// Currency display mask scaled to the column's magnitude: each trailing
/// comma divides the displayed value by a thousand.
fn currency_mask(max_abs: f64) -> &'static str {
    if max_abs >= 1e9 {
        "$#,##0.00,,,\"B\""
    } else if max_abs >= 1e6 {
        "$#,##0.00,,\"M\""
    } else if max_abs >= 1e3 {
        "$#,##0.00,\"K\""
    } else {
        "$#,##0.00"
    }
}
