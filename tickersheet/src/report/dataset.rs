//! The report dataset and its pivot into per-tab sheets.

use crate::normalize::Value;
use crate::Tab;

/// A ticker and its company name, parsed once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerRecord {
    pub symbol: String,
    pub company_name: String,
}

/// Typed fields for one (ticker, tab) pair.
#[derive(Debug, Clone)]
pub struct NormalizedRow {
    pub ticker: TickerRecord,
    pub tab: Tab,
    pub fields: Vec<(String, Value)>,
}

/// Append-only collection of normalized rows, owned by the pipeline's
/// accumulating task. Insertion order is input ticker order then tab order,
/// so the final workbook is deterministic regardless of task completion
/// order.
#[derive(Debug, Default)]
pub struct ReportDataset {
    rows: Vec<NormalizedRow>,
}

impl ReportDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, row: NormalizedRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Pivot into one sheet per tab: columns in first-seen field order, one
    /// row per ticker in insertion order, missing cells explicit.
    pub fn pivot(&self) -> Pivot {
        let mut sheets = Vec::new();

        for tab in Tab::ALL {
            let tab_rows: Vec<&NormalizedRow> =
                self.rows.iter().filter(|r| r.tab == tab).collect();
            if tab_rows.is_empty() {
                continue;
            }

            // Column order: field names as first seen across the tab's rows
            let mut names: Vec<String> = Vec::new();
            for row in &tab_rows {
                for (name, _) in &row.fields {
                    if !names.iter().any(|n| n == name) {
                        names.push(name.clone());
                    }
                }
            }

            // One sheet row per ticker, fields merged when a ticker was
            // visited more than once
            let mut sheet_rows: Vec<SheetRow> = Vec::new();
            for row in &tab_rows {
                let idx = match sheet_rows
                    .iter()
                    .position(|r| r.ticker.symbol == row.ticker.symbol)
                {
                    Some(idx) => idx,
                    None => {
                        sheet_rows.push(SheetRow {
                            ticker: row.ticker.clone(),
                            values: vec![Value::Missing; names.len()],
                        });
                        sheet_rows.len() - 1
                    }
                };
                for (name, value) in &row.fields {
                    if let Some(col) = names.iter().position(|n| n == name) {
                        sheet_rows[idx].values[col] = value.clone();
                    }
                }
            }

            let columns = names
                .into_iter()
                .enumerate()
                .map(|(col, name)| Column {
                    kind: infer_kind(sheet_rows.iter().map(|r| &r.values[col])),
                    name,
                })
                .collect();

            sheets.push(SheetData {
                tab,
                columns,
                rows: sheet_rows,
            });
        }

        Pivot { sheets }
    }
}

/// The pivoted dataset, ready for workbook rendering.
#[derive(Debug)]
pub struct Pivot {
    pub sheets: Vec<SheetData>,
}

/// One output sheet: a tab's columns and ticker rows.
#[derive(Debug)]
pub struct SheetData {
    pub tab: Tab,
    pub columns: Vec<Column>,
    pub rows: Vec<SheetRow>,
}

/// A field column with its display formatting kind.
#[derive(Debug)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// One ticker's values for a sheet, aligned to its columns.
#[derive(Debug)]
pub struct SheetRow {
    pub ticker: TickerRecord,
    pub values: Vec<Value>,
}

/// Display formatting class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Currency,
    Percent,
    Number,
    Text,
}

/// Infer a column's kind from its values: any currency value makes it a
/// currency column, then percent, then number; all-missing columns render
/// as text.
fn infer_kind<'a>(values: impl Iterator<Item = &'a Value>) -> ColumnKind {
    let mut kind = ColumnKind::Text;
    for value in values {
        match value {
            Value::Currency(_) => return ColumnKind::Currency,
            Value::Percent(_) => kind = ColumnKind::Percent,
            Value::Number(_) => {
                if kind == ColumnKind::Text {
                    kind = ColumnKind::Number;
                }
            }
            Value::Text(_) | Value::Missing => {}
        }
    }
    kind
}
