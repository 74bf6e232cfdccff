//! Date parsing and the two template date formats.
//!
//! Inputs without an explicit offset are taken as UTC. Anything that does not
//! parse formats as [`INVALID_DATE`] rather than failing the render.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Placeholder produced for unparseable input.
pub const INVALID_DATE: &str = "Invalid date";

/// Naive layouts tried after RFC 3339, all read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a date/time string.
///
/// Accepts RFC 3339 (any offset, converted to UTC), `YYYY-MM-DDTHH:MM:SS`
/// with optional fraction, the same with a space separator, minute precision,
/// and bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Parse a template value: strings as above, integers as epoch milliseconds.
pub fn parse_date_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date(s),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// `DD Mon YYYY`, e.g. `05 Mar 2021`.
pub fn format_post_date(dt: &DateTime<Utc>) -> String {
    dt.format("%d %b %Y").to_string()
}

/// ISO-8601 UTC with second precision, e.g. `2021-03-05T00:00:00Z`.
pub fn format_iso_date(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Human-readable date for post listings.
pub fn post_date(value: &Value) -> String {
    parse_date_value(value).map_or_else(|| INVALID_DATE.to_owned(), |dt| format_post_date(&dt))
}

/// Machine-readable date for `<time datetime>` and feeds.
pub fn iso_date(value: &Value) -> String {
    parse_date_value(value).map_or_else(|| INVALID_DATE.to_owned(), |dt| format_iso_date(&dt))
}
