//! Field normalization: raw display text into typed values.
//!
//! This is the only place raw strings become typed data. Every conversion is
//! a pure function; parse failures surface as `ScrapeError::Parse` and the
//! caller keeps the row with the field marked missing.

use crate::error::ScrapeError;
use crate::extract::TabSnapshot;
use crate::report::{NormalizedRow, TickerRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// A typed field value.
///
/// Percent values are stored as fractions (12% → 0.12); currency values are
/// stored fully scaled ($1.23T → 1.23e12).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Percent(f64),
    Currency(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Numeric view, if this value carries one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) | Value::Percent(n) | Value::Currency(n) => Some(*n),
            Value::Text(_) | Value::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

/// Placeholder strings the site renders for absent figures.
const MISSING_MARKERS: &[&str] = &["", "-", "—", "–", "\u{2212}", "N/A", "n/a", "null"];

/// Suffix multipliers for scaled figures.
fn suffix_multiplier(c: char) -> Option<f64> {
    match c.to_ascii_uppercase() {
        'T' => Some(1e12),
        'B' => Some(1e9),
        'M' => Some(1e6),
        'K' => Some(1e3),
        _ => None,
    }
}

/// Parse a numeric body: thousands separators and explicit plus signs
/// stripped, Unicode minus accepted, optional T/B/M/K suffix applied.
fn parse_scaled(body: &str) -> Option<f64> {
    let mut text = body.trim().replace('\u{2212}', "-");
    text.retain(|c| c != ',' && c != '+' && !c.is_whitespace());
    if text.is_empty() {
        return None;
    }

    let mut multiplier = 1.0;
    if let Some(last) = text.chars().last() {
        if let Some(m) = suffix_multiplier(last) {
            multiplier = m;
            text.pop();
        }
    }

    let value: f64 = text.parse().ok()?;
    let scaled = value * multiplier;
    scaled.is_finite().then_some(scaled)
}

/// Convert one raw field string into a typed value.
///
/// Missing markers map to `Value::Missing`, never to zero. A `$`- or
/// `%`-marked string whose numeric body does not parse is a `Parse` error;
/// plain non-numeric text is legitimate (`Value::Text`).
pub fn parse_field(field: &str, raw: &str) -> Result<Value, ScrapeError> {
    let text = raw.trim();

    if MISSING_MARKERS.contains(&text) {
        return Ok(Value::Missing);
    }

    let parse_err = || ScrapeError::Parse {
        field: field.to_string(),
        raw: raw.to_string(),
    };

    if let Some(body) = text.strip_suffix('%') {
        if MISSING_MARKERS.contains(&body.trim()) {
            return Ok(Value::Missing);
        }
        let value = parse_scaled(body).ok_or_else(parse_err)?;
        return Ok(Value::Percent(value / 100.0));
    }

    // Currency: the sign may sit before or after the '$'
    let (negated, unsigned) = match text.strip_prefix(['-', '\u{2212}']) {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    if let Some(body) = unsigned.strip_prefix('$') {
        if MISSING_MARKERS.contains(&body.trim()) {
            return Ok(Value::Missing);
        }
        let value = parse_scaled(body).ok_or_else(parse_err)?;
        return Ok(Value::Currency(if negated { -value } else { value }));
    }

    if let Some(value) = parse_scaled(text) {
        return Ok(Value::Number(value));
    }

    Ok(Value::Text(text.to_string()))
}

/// Symbol-then-name pattern: a short uppercase token (digits, `.` and `-`
/// allowed) followed by the company name.
static SYMBOL_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z][A-Z0-9.\-]{0,9})\s+(\S.*)$").expect("valid regex"));

/// Split a ticker name cell into (symbol, company name).
///
/// Handles "AAPL\nApple Inc.", "AAPL Apple Inc." and a bare symbol. When no
/// split applies the whole text is kept as the symbol with an empty name.
pub fn split_ticker_cell(text: &str) -> (String, String) {
    let text = text.trim();

    if let Some((first, rest)) = text.split_once('\n') {
        let name = rest.split_whitespace().collect::<Vec<_>>().join(" ");
        return (first.trim().to_string(), name);
    }

    if text.len() <= 5 && !text.is_empty() && text.chars().all(|c| c.is_ascii_uppercase()) {
        return (text.to_string(), String::new());
    }

    if let Some(captures) = SYMBOL_NAME_RE.captures(text) {
        return (captures[1].to_string(), captures[2].trim().to_string());
    }

    (text.to_string(), String::new())
}

/// Normalize a tab snapshot into a typed row.
///
/// Per-field parse failures are logged with their context and marked
/// missing; the row is always kept.
pub fn normalize_snapshot(ticker: &TickerRecord, snapshot: &TabSnapshot) -> NormalizedRow {
    let fields = snapshot
        .fields
        .iter()
        .map(|(name, raw)| {
            let value = match parse_field(name, raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!(
                        symbol = %ticker.symbol,
                        tab = %snapshot.tab,
                        field = %name,
                        "{e}; marking field missing"
                    );
                    Value::Missing
                }
            };
            (name.clone(), value)
        })
        .collect();

    NormalizedRow {
        ticker: ticker.clone(),
        tab: snapshot.tab,
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> Value {
        parse_field("test", raw).unwrap()
    }

    #[test]
    fn test_currency_suffixes() {
        assert_eq!(parsed("$1.23T"), Value::Currency(1.23e12));
        assert_eq!(parsed("$45.6B"), Value::Currency(45.6e9));
        assert_eq!(parsed("$78K"), Value::Currency(78e3));
        assert_eq!(parsed("$228.52"), Value::Currency(228.52));
    }

    #[test]
    fn test_currency_thousands_separators() {
        assert_eq!(parsed("$1,234,567.89"), Value::Currency(1_234_567.89));
    }

    #[test]
    fn test_negative_currency() {
        assert_eq!(parsed("-$1.5M"), Value::Currency(-1.5e6));
        assert_eq!(parsed("\u{2212}$2B"), Value::Currency(-2e9));
    }

    #[test]
    fn test_percent() {
        assert_eq!(parsed("0.45%"), Value::Percent(0.0045));
        assert_eq!(parsed("12%"), Value::Percent(0.12));
        assert_eq!(parsed("\u{2212}2.5%"), Value::Percent(-0.025));
    }

    #[test]
    fn test_missing_markers_never_zero() {
        for marker in ["—", "–", "-", "N/A", "n/a", ""] {
            let value = parsed(marker);
            assert!(value.is_missing(), "{marker:?} must be Missing");
            assert_ne!(value, Value::Number(0.0));
        }
        assert!(parsed("—%").is_missing());
    }

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parsed("36.2"), Value::Number(36.2));
        assert_eq!(parsed("1,024"), Value::Number(1024.0));
        assert_eq!(parsed("2.5M"), Value::Number(2.5e6));
    }

    #[test]
    fn test_text_passthrough() {
        assert_eq!(
            parsed("Electronic Technology"),
            Value::Text("Electronic Technology".to_string())
        );
    }

    #[test]
    fn test_malformed_marked_values_error() {
        assert!(parse_field("Price", "$12x3").is_err());
        assert!(parse_field("Yield", "abc%").is_err());
    }

    #[test]
    fn test_split_ticker_newline() {
        let (symbol, name) = split_ticker_cell("AAPL\nApple Inc.");
        assert_eq!(symbol, "AAPL");
        assert_eq!(name, "Apple Inc.");
    }

    #[test]
    fn test_split_ticker_space() {
        let (symbol, name) = split_ticker_cell("AAPL Apple Inc.");
        assert_eq!(symbol, "AAPL");
        assert_eq!(name, "Apple Inc.");
    }

    #[test]
    fn test_split_ticker_bare_symbol() {
        assert_eq!(split_ticker_cell("TSLA"), ("TSLA".to_string(), String::new()));
    }

    #[test]
    fn test_split_ticker_with_class_suffix() {
        let (symbol, name) = split_ticker_cell("BRK.B Berkshire Hathaway Inc.");
        assert_eq!(symbol, "BRK.B");
        assert_eq!(name, "Berkshire Hathaway Inc.");
    }

    #[test]
    fn test_split_ticker_fallback_keeps_text() {
        let (symbol, name) = split_ticker_cell("Some Company Name");
        assert_eq!(symbol, "Some Company Name");
        assert_eq!(name, "");
    }

    #[test]
    fn test_normalize_snapshot_keeps_row_on_parse_error() {
        use crate::extract::RawTable;
        use crate::Tab;

        let raw = RawTable {
            headers: vec![],
            rows: vec![
                vec!["Price".into(), "$228.52".into()],
                vec!["Yield".into(), "abc%".into()],
                vec!["Volume".into(), "N/A".into()],
            ],
        };
        let snapshot = TabSnapshot::from_raw(Tab::Overview, raw, true);
        let ticker = TickerRecord {
            symbol: "AAPL".into(),
            company_name: "Apple Inc.".into(),
        };

        let row = normalize_snapshot(&ticker, &snapshot);
        assert_eq!(row.fields.len(), 3);
        assert_eq!(row.fields[0].1, Value::Currency(228.52));
        assert!(row.fields[1].1.is_missing()); // malformed, kept as missing
        assert!(row.fields[2].1.is_missing());
    }
}
