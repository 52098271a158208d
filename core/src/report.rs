//! CSV report writing.

use crate::{
    error::AnalysisResult,
    overlap_accumulator::OccupancyResult,
    queue_metrics::IntervalMetrics,
};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct OccupancyRow<'a> {
    #[serde(rename = "Interval")]
    interval: &'a str,
    #[serde(rename = "ConnectedAgents")]
    connected_agents: u32,
}

pub fn write_report<W: Write>(writer: W, rows: &[IntervalMetrics]) -> AnalysisResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_report_file(path: &Path, rows: &[IntervalMetrics]) -> AnalysisResult<()> {
    write_report(std::fs::File::create(path)?, rows)?;
    log::info!("Wrote {} intervals to {}", rows.len(), path.display());
    Ok(())
}

/// All 48 buckets, zero counts included.
pub fn write_occupancy<W: Write>(writer: W, result: &OccupancyResult) -> AnalysisResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (interval, connected_agents) in result.iter() {
        csv_writer.serialize(OccupancyRow { interval, connected_agents })?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_occupancy_file(path: &Path, result: &OccupancyResult) -> AnalysisResult<()> {
    write_occupancy(std::fs::File::create(path)?, result)
}
