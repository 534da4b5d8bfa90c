//! Raw table shaping: DOM extraction output into per-tab field pairs.

use crate::Tab;
use serde::Deserialize;

/// Table text as extracted from the DOM in one JS evaluation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTable {
    /// Header names (may be empty for headerless key/value tables).
    pub headers: Vec<String>,
    /// Cell text per row.
    pub rows: Vec<Vec<String>>,
}

/// One (ticker, tab) visit's raw field pairs, pre-normalization.
#[derive(Debug, Clone)]
pub struct TabSnapshot {
    pub tab: Tab,
    pub fields: Vec<(String, String)>,
    /// False when the row count never stabilized and these are partial rows.
    pub complete: bool,
}

impl TabSnapshot {
    /// Shape a raw table into field pairs.
    ///
    /// Two layouts occur on ticker pages:
    /// - headerless (or single-header) key/value tables: each row is one
    ///   field, first cell the name, remaining cells the value;
    /// - wide tables keyed by header: each row's cells pair up with the
    ///   header names (short rows padded, surplus headers ignored per row).
    pub fn from_raw(tab: Tab, raw: RawTable, complete: bool) -> Self {
        let fields = if raw.headers.len() >= 2 {
            Self::wide_fields(&raw)
        } else {
            Self::key_value_fields(&raw)
        };
        Self {
            tab,
            fields,
            complete,
        }
    }

    fn wide_fields(raw: &RawTable) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        for (row_idx, row) in raw.rows.iter().enumerate() {
            for (col_idx, header) in raw.headers.iter().enumerate() {
                if header.is_empty() {
                    continue;
                }
                let value = row.get(col_idx).cloned().unwrap_or_default();
                let name = if row_idx == 0 {
                    header.clone()
                } else {
                    format!("{} ({})", header, row_idx + 1)
                };
                fields.push((name, value));
            }
        }
        fields
    }

    fn key_value_fields(raw: &RawTable) -> Vec<(String, String)> {
        raw.rows
            .iter()
            .filter_map(|row| {
                let name = row.first()?.trim().to_string();
                if name.is_empty() {
                    return None;
                }
                let value = row[1..].join(" ").trim().to_string();
                Some((name, value))
            })
            .collect()
    }

    /// Number of extracted fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_key_value_table() {
        let table = raw(&[], &[&["Price", "$228.52"], &["P/E", "36.2"]]);
        let snapshot = TabSnapshot::from_raw(Tab::Overview, table, true);
        assert_eq!(
            snapshot.fields,
            vec![
                ("Price".to_string(), "$228.52".to_string()),
                ("P/E".to_string(), "36.2".to_string()),
            ]
        );
        assert!(snapshot.complete);
    }

    #[test]
    fn test_key_value_joins_extra_cells() {
        let table = raw(&[], &[&["Sector", "Electronic", "Technology"]]);
        let snapshot = TabSnapshot::from_raw(Tab::Overview, table, true);
        assert_eq!(snapshot.fields[0].1, "Electronic Technology");
    }

    #[test]
    fn test_wide_table_pairs_headers_with_cells() {
        let table = raw(
            &["Market Cap", "Div Yield"],
            &[&["$3.2T", "0.45%"]],
        );
        let snapshot = TabSnapshot::from_raw(Tab::Dividends, table, true);
        assert_eq!(
            snapshot.fields,
            vec![
                ("Market Cap".to_string(), "$3.2T".to_string()),
                ("Div Yield".to_string(), "0.45%".to_string()),
            ]
        );
    }

    #[test]
    fn test_wide_table_pads_short_rows() {
        let table = raw(&["A", "B", "C"], &[&["1", "2"]]);
        let snapshot = TabSnapshot::from_raw(Tab::Overview, table, true);
        assert_eq!(snapshot.fields[2], ("C".to_string(), String::new()));
    }

    #[test]
    fn test_wide_table_numbers_later_rows() {
        let table = raw(&["Revenue"], &[&["x"]]);
        // single header falls back to key/value mode
        let snapshot = TabSnapshot::from_raw(Tab::Financials, table, true);
        assert_eq!(snapshot.fields, vec![("x".to_string(), String::new())]);

        let table = raw(&["Revenue", "Net Income"], &[&["10", "2"], &["12", "3"]]);
        let snapshot = TabSnapshot::from_raw(Tab::Financials, table, true);
        assert_eq!(snapshot.fields[2].0, "Revenue (2)");
        assert_eq!(snapshot.fields[2].1, "12");
    }

    #[test]
    fn test_blank_names_skipped() {
        let table = raw(&[], &[&["", "ignored"], &["Price", "1.00"]]);
        let snapshot = TabSnapshot::from_raw(Tab::Overview, table, false);
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.complete);
    }
}
