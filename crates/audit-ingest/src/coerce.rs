//! Lenient conversion of raw cells into typed values.
//!
//! A single bad cell must never abort an analysis of thousands of rows, so
//! every function here is total: unparseable numbers resolve to `None` (or
//! 0.0 through [`parse_amount`]) and unparseable text or dates to `None`.

use audit_model::CellValue;
use chrono::NaiveDate;

/// Text values treated as empty cells.
const MISSING_MARKERS: &[&str] = &["", "nan", "null", "none", "n/a", "na", "#n/a"];

/// Currency symbols stripped before numeric parsing.
const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹', '₣'];

/// Date layouts accepted by [`parse_date_str`], tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d"];

/// Returns true when the cell is absent, null, or a missing-value marker.
pub fn is_missing(value: Option<&CellValue>) -> bool {
    match value {
        None | Some(CellValue::Null) => true,
        Some(CellValue::Text(s)) => is_missing_text(s),
        Some(CellValue::Number(n)) => n.is_nan(),
        Some(CellValue::Bool(_)) => false,
    }
}

fn is_missing_text(raw: &str) -> bool {
    let trimmed = raw.trim();
    MISSING_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Parse a monetary string.
///
/// Handles:
/// - Thousands separators and whitespace: "1,234.50", " 99 "
/// - Currency symbols and codes: "$1,200", "USD 40"
/// - Accounting negatives: "(125.00)" and trailing minus "125.00-"
///
/// Returns `None` for anything else, including non-finite values.
pub fn parse_amount_str(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if is_missing_text(trimmed) {
        return None;
    }

    let mut negative = false;
    let mut body = trimmed;
    if let Some(inner) = body.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        negative = true;
        body = inner;
    }
    if let Some(inner) = body.strip_suffix('-') {
        negative = !negative;
        body = inner;
    }

    let upper = body.to_ascii_uppercase();
    let body = upper
        .trim()
        .trim_start_matches("USD")
        .trim_start_matches("EUR")
        .trim_start_matches("GBP")
        .trim_end_matches("USD")
        .trim_end_matches("EUR")
        .trim_end_matches("GBP");

    let cleaned: String = body
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && !CURRENCY_SYMBOLS.contains(c))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Numeric value of a cell, or `None` when it cannot be read as an amount.
pub fn parse_optional_amount(value: Option<&CellValue>) -> Option<f64> {
    match value? {
        CellValue::Number(n) if n.is_finite() => Some(*n),
        CellValue::Text(s) => parse_amount_str(s),
        _ => None,
    }
}

/// Numeric value of a cell, falling back to 0.0.
pub fn parse_amount(value: Option<&CellValue>) -> f64 {
    parse_optional_amount(value).unwrap_or(0.0)
}

/// Trimmed text of a cell; empty and missing-value markers become `None`.
pub fn parse_text(value: Option<&CellValue>) -> Option<String> {
    match value? {
        CellValue::Null => None,
        CellValue::Bool(b) => Some(b.to_string()),
        CellValue::Number(n) if n.is_finite() => Some(format_number(*n)),
        CellValue::Number(_) => None,
        CellValue::Text(s) => {
            if is_missing_text(s) {
                None
            } else {
                Some(s.trim().to_string())
            }
        }
    }
}

/// Formats a number without a trailing ".0" so numeric IDs read naturally.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Parse a calendar date from common ledger export layouts.
///
/// Datetime strings ("2024-03-01T10:15:00", "2024-03-01 10:15") are
/// truncated to their date part.
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let date_part = match trimmed.find(['T', ' ']) {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    };
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

pub fn parse_date(value: Option<&CellValue>) -> Option<NaiveDate> {
    match value? {
        CellValue::Text(s) => parse_date_str(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_amount_str("123"), Some(123.0));
        assert_eq!(parse_amount_str("-45.67"), Some(-45.67));
        assert_eq!(parse_amount_str("  99  "), Some(99.0));
    }

    #[test]
    fn test_thousands_and_currency() {
        assert_eq!(parse_amount_str("1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_amount_str("$1,234.56"), Some(1234.56));
        assert_eq!(parse_amount_str("USD 40"), Some(40.0));
        assert_eq!(parse_amount_str("€ 12.5"), Some(12.5));
    }

    #[test]
    fn test_accounting_negatives() {
        assert_eq!(parse_amount_str("(125.00)"), Some(-125.0));
        assert_eq!(parse_amount_str("125.00-"), Some(-125.0));
        assert_eq!(parse_amount_str("($1,000)"), Some(-1000.0));
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(parse_amount_str("abc"), None);
        assert_eq!(parse_amount_str(""), None);
        assert_eq!(parse_amount_str("N/A"), None);
        assert_eq!(parse_amount_str("inf"), None);
        assert_eq!(parse_amount_str("NaN"), None);
    }

    #[test]
    fn test_amount_defaults_to_zero() {
        assert_eq!(parse_amount(None), 0.0);
        assert_eq!(parse_amount(Some(&CellValue::from("oops"))), 0.0);
        assert_eq!(parse_amount(Some(&CellValue::Bool(true))), 0.0);
        assert_eq!(parse_amount(Some(&CellValue::Number(7.5))), 7.5);
    }

    #[test]
    fn test_text() {
        assert_eq!(parse_text(Some(&CellValue::from("  Acme  "))), Some("Acme".into()));
        assert_eq!(parse_text(Some(&CellValue::from("null"))), None);
        assert_eq!(parse_text(Some(&CellValue::Number(1001.0))), Some("1001".into()));
        assert_eq!(parse_text(Some(&CellValue::Null)), None);
        assert_eq!(parse_text(None), None);
    }

    #[test]
    fn test_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(parse_date_str("2024-03-01"), expected);
        assert_eq!(parse_date_str("2024/03/01"), expected);
        assert_eq!(parse_date_str("03/01/2024"), expected);
        assert_eq!(parse_date_str("01.03.2024"), expected);
        assert_eq!(parse_date_str("2024-03-01T10:15:00"), expected);
        assert_eq!(parse_date_str("2024-03-01 10:15"), expected);
        assert_eq!(parse_date_str("not a date"), None);
        assert_eq!(parse_date_str("2024-02-30"), None);
    }

    #[test]
    fn test_missing() {
        assert!(is_missing(None));
        assert!(is_missing(Some(&CellValue::Null)));
        assert!(is_missing(Some(&CellValue::from("  "))));
        assert!(is_missing(Some(&CellValue::from("N/A"))));
        assert!(!is_missing(Some(&CellValue::from("0"))));
        assert!(!is_missing(Some(&CellValue::Number(0.0))));
    }
}
