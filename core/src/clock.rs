//! Timestamp parsing and day-boundary helpers for the export formats.

use crate::types::{EXPORT_DATE_FORMAT, INTERVAL_TIMESTAMP_FORMAT, TIMELINE_TIMESTAMP_FORMAT};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Last instant counted for a day. Shifts are never extended past it.
pub const END_OF_DAY_OFFSET_SECONDS: i64 = 86_399;

/// Parse a timeline timestamp (`dd/mm/yy HH:MM:SS`).
/// Empty or whitespace-only input yields `None`, as does garbage.
pub fn parse_timeline_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, TIMELINE_TIMESTAMP_FORMAT).ok()
}

/// Parse a queue interval bound (`dd/mm/yy HH:MM`). Seconds are accepted too,
/// some exports carry them.
pub fn parse_interval_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, INTERVAL_TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, TIMELINE_TIMESTAMP_FORMAT))
        .ok()
}

/// Parse only the date portion (the first whitespace-separated token).
pub fn parse_date_portion(raw: &str) -> Option<NaiveDate> {
    let token = raw.split_whitespace().next()?;
    NaiveDate::parse_from_str(token, EXPORT_DATE_FORMAT).ok()
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}

/// `23:59:59` of `date`.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::seconds(END_OF_DAY_OFFSET_SECONDS)
}

pub fn format_timeline_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMELINE_TIMESTAMP_FORMAT).to_string()
}

/// Render seconds as `HH:MM:SS`.
pub fn format_hms(total_seconds: f64) -> String {
    let secs = if total_seconds.is_finite() && total_seconds > 0.0 {
        total_seconds as i64
    } else {
        0
    };
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
