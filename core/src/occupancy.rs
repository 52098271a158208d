//! Single-call occupancy: `(entries, target date) -> OccupancyResult`.
//!
//! Entries are expected to be filtered to one roster and to in-queue states
//! already. Pure: no shared state between calls.

use crate::{
    config::{AnalysisConfig, SearchWindow},
    date_selector::select_target_date,
    end_time_resolver::ResolvedTimeline,
    error::AnalysisResult,
    interval_grid::IntervalGrid,
    overlap_accumulator::{accumulate, OccupancyResult},
    timeline::RawTimelineEntry,
    types::DWELL_THRESHOLD_MINUTES,
};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancySettings {
    pub dwell_threshold_minutes: i64,
    pub search_window:           SearchWindow,
}

impl Default for OccupancySettings {
    fn default() -> Self {
        Self {
            dwell_threshold_minutes: DWELL_THRESHOLD_MINUTES,
            search_window:           SearchWindow::default(),
        }
    }
}

impl From<&AnalysisConfig> for OccupancySettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            dwell_threshold_minutes: config.dwell_threshold_minutes,
            search_window:           config.search_window.clone(),
        }
    }
}

/// Resolve end times, then count distinct present agents per bucket.
/// Without `target_date` the date is detected from the entries' starts and
/// `NoDateDetected` is returned when none parses.
pub fn compute_occupancy(
    entries: &[RawTimelineEntry],
    target_date: Option<NaiveDate>,
    settings: &OccupancySettings,
) -> AnalysisResult<OccupancyResult> {
    let date = match target_date {
        Some(date) => date,
        None => select_target_date(entries, "timeline entries")?,
    };
    let resolved = ResolvedTimeline::resolve(entries, &settings.search_window);
    let grid = IntervalGrid::for_date(date);
    Ok(accumulate(&grid, resolved.all_records(), settings.dwell_threshold_minutes))
}
