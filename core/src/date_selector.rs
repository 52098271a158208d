//! Target date detection.
//!
//! Entries are scanned in their given order and the date portion of the
//! first non-empty, parseable timestamp wins. When nothing parses the
//! caller gets `NoDateDetected`, never a fallback date.

use crate::{
    clock::parse_date_portion,
    error::{AnalysisError, AnalysisResult},
    timeline::RawTimelineEntry,
};
use chrono::NaiveDate;

/// First parseable date among `values`, in order. `source_name` names the
/// input in the error.
pub fn first_date<'a, I>(values: I, source_name: &str) -> AnalysisResult<NaiveDate>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .filter(|v| !v.trim().is_empty())
        .find_map(parse_date_portion)
        .ok_or_else(|| AnalysisError::NoDateDetected {
            source_name: source_name.to_string(),
        })
}

/// Target date from the start column of a timeline.
pub fn select_target_date(
    entries: &[RawTimelineEntry],
    source_name: &str,
) -> AnalysisResult<NaiveDate> {
    first_date(entries.iter().map(|e| e.start.as_str()), source_name)
}

/// Try each candidate column in turn; the first that yields a date wins.
pub fn select_from_columns<'a>(
    columns: &[Vec<&'a str>],
    source_name: &str,
) -> AnalysisResult<NaiveDate> {
    for column in columns {
        if let Ok(date) = first_date(column.iter().copied(), source_name) {
            return Ok(date);
        }
    }
    Err(AnalysisError::NoDateDetected {
        source_name: source_name.to_string(),
    })
}
