//! Typed input records and the section layouts of each report kind.
//!
//! Records are deserialized leniently: a missing key, `null`, and an empty or
//! whitespace-only string all become `None`, and numbers are accepted where
//! the stored documents sometimes hold text.

pub mod company;
pub mod engineer;
pub mod inspection;
pub mod material;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) const OFFICIAL_USE_FOOTER: &str =
    "This document is system-generated and valid for official Railways use.";

pub(crate) fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_text))
}

pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    })
}

/// Date and time at `offset`, day first.
pub fn format_timestamp(ts: DateTime<Utc>, offset: FixedOffset) -> String {
    ts.with_timezone(&offset)
        .format("%d/%m/%Y, %H:%M:%S")
        .to_string()
}

/// RFC 3339, a zone-less ISO date-time (taken as UTC), or a bare `YYYY-MM-DD`.
pub(crate) fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|n| n.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|n| n.and_utc())
        })
}

/// Format whatever a timestamp field holds: a stored `{seconds, nanoseconds}`
/// timestamp, epoch milliseconds, or a date string. Unparseable strings are
/// shown as-is.
pub fn format_any_date(value: Option<&Value>, offset: FixedOffset) -> Option<String> {
    let show = |ts| format_timestamp(ts, offset);
    match value? {
        Value::Object(map) => {
            let field = |a: &str, b: &str| map.get(a).or_else(|| map.get(b)).and_then(Value::as_i64);
            let secs = field("seconds", "_seconds")?;
            let nanos = field("nanoseconds", "_nanoseconds").unwrap_or(0);
            DateTime::from_timestamp(secs, nanos.clamp(0, 999_999_999) as u32)
                .map(show)
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(show),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(
            parse_date_string(s)
                .map(show)
                .unwrap_or_else(|| s.clone()),
        ),
        _ => None,
    }
}
