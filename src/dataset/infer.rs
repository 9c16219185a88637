//! Content-based column kind inference for raw text values.
//!
//! Order of precedence: boolean literals, numbers, dates/datetimes, and
//! finally categorical text. A column qualifies for a kind only when every
//! non-null value parses as that kind.

use super::Column;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const NULL_TOKENS: &[&str] = &["", "na", "n/a", "nan", "null", "none", "nil", "-"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

pub fn is_null_token(raw: &str) -> bool {
    let trimmed = raw.trim();
    NULL_TOKENS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a date or datetime into epoch milliseconds (UTC).
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp_millis());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_millis());
        }
    }
    None
}

fn parse_all<T>(values: &[Option<&str>], parse: impl Fn(&str) -> Option<T>) -> Option<Vec<Option<T>>> {
    values
        .iter()
        .map(|v| match v {
            Some(s) => parse(s).map(Some),
            None => Some(None),
        })
        .collect()
}

pub fn infer_column(name: String, raw: Vec<Option<String>>) -> Column {
    let cleaned: Vec<Option<String>> = raw
        .into_iter()
        .map(|v| v.filter(|s| !is_null_token(s)))
        .collect();

    // An all-null column carries no evidence; keep it as text.
    if cleaned.iter().all(Option::is_none) {
        return Column::categorical(name, cleaned);
    }

    let borrowed: Vec<Option<&str>> = cleaned.iter().map(Option::as_deref).collect();

    if let Some(values) = parse_all(&borrowed, parse_bool) {
        return Column::boolean(name, values);
    }
    if let Some(values) = parse_all(&borrowed, parse_number) {
        return Column::numeric(name, values);
    }
    if let Some(values) = parse_all(&borrowed, parse_timestamp) {
        return Column::temporal(name, values);
    }

    Column::categorical(
        name,
        cleaned
            .into_iter()
            .map(|v| v.map(|s| s.trim().to_owned()))
            .collect(),
    )
}
