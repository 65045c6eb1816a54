//! Lenient date handling for sheet cells

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Date-only formats seen in the `ngay` column
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Date-time formats; only the date part is kept
const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Current date (UTC)
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse a cell value into a calendar date
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Parse a cell value, falling back to `fallback` when absent or malformed
pub fn coerce_date(value: Option<&str>, fallback: NaiveDate) -> NaiveDate {
    value.and_then(parse_date).unwrap_or(fallback)
}

/// Serialize a date the way the sheet expects on edit (no time component)
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
