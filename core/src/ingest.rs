//! CSV ingestion for the two platform exports.
//!
//! Both files come with Spanish headers and are usually `;`-delimited; a
//! `,`-delimited export is accepted too. The delimiter is picked from the
//! header line. Rows that fail to deserialize are skipped with a warning.

use crate::{error::AnalysisResult, timeline::RawTimelineEntry};
use serde::{Deserialize, Deserializer, Serialize};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TimelineRow {
    #[serde(rename = "Nombre del agente")]
    agent: String,
    #[serde(rename = "Estado principal", default)]
    principal_state: String,
    #[serde(rename = "Hora de inicio", default)]
    start: String,
    #[serde(rename = "Hora de finalización", default)]
    end: String,
    #[serde(rename = "Nombre de la división", default)]
    division: Option<String>,
    #[serde(rename = "Inicio del intervalo", default)]
    interval_start: Option<String>,
}

/// Parsed agent status timeline.
#[derive(Debug, Clone, Default)]
pub struct TimelineExport {
    pub entries:         Vec<RawTimelineEntry>,
    /// `Inicio del intervalo` cells in row order, when the column exists.
    pub interval_starts: Vec<String>,
    pub skipped_rows:    usize,
}

/// One row of the queue performance export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueIntervalRow {
    #[serde(rename = "Nombre de cola")]
    pub queue: String,
    #[serde(rename = "Inicio del intervalo")]
    pub interval_start: String,
    #[serde(rename = "Fin del intervalo", default)]
    pub interval_end: String,
    #[serde(rename = "Oferta", default, deserialize_with = "lenient_count")]
    pub offered: u64,
    #[serde(rename = "Contestadas", default, deserialize_with = "lenient_count")]
    pub answered: u64,
    #[serde(rename = "Abandonadas", default, deserialize_with = "lenient_count")]
    pub abandoned: u64,
    #[serde(rename = "Cumplen el SLA", default, deserialize_with = "lenient_count")]
    pub within_sla: u64,
    #[serde(rename = "Retener", default, deserialize_with = "lenient_count")]
    pub retained: u64,
    /// Outbound contacts placed from the queue.
    #[serde(rename = "Contactando", default, deserialize_with = "lenient_count")]
    pub contacted: u64,
    #[serde(rename = "Manejo total", default)]
    pub handle_total: String,
    #[serde(rename = "Manejo medio", default)]
    pub handle_average: String,
}

/// Empty or non-numeric cells count as 0.
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(parse_count(&raw))
}

pub fn parse_count(raw: &str) -> u64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v.round() as u64,
        _ => 0,
    }
}

pub fn read_timeline<R: Read>(mut reader: R) -> AnalysisResult<TimelineExport> {
    let content = read_text(&mut reader)?;
    let mut csv_reader = csv_reader_for(&content);

    let mut export = TimelineExport::default();
    for (line, row) in csv_reader.deserialize::<TimelineRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                log::warn!("Skipping timeline row {}: {e}", line + 2);
                export.skipped_rows += 1;
                continue;
            }
        };
        if let Some(interval_start) = row.interval_start {
            export.interval_starts.push(interval_start);
        }
        export.entries.push(RawTimelineEntry {
            agent:           row.agent,
            principal_state: row.principal_state,
            start:           row.start,
            end:             row.end,
            division:        row.division.filter(|d| !d.trim().is_empty()),
        });
    }
    log::info!(
        "Timeline: {} entries read, {} rows skipped",
        export.entries.len(),
        export.skipped_rows
    );
    Ok(export)
}

pub fn read_timeline_file(path: &Path) -> AnalysisResult<TimelineExport> {
    read_timeline(std::fs::File::open(path)?)
}

pub fn read_queue_performance<R: Read>(mut reader: R) -> AnalysisResult<Vec<QueueIntervalRow>> {
    let content = read_text(&mut reader)?;
    let mut csv_reader = csv_reader_for(&content);

    let mut rows = Vec::new();
    for (line, row) in csv_reader.deserialize::<QueueIntervalRow>().enumerate() {
        match row {
            Ok(row) => rows.push(row),
            Err(e) => log::warn!("Skipping queue performance row {}: {e}", line + 2),
        }
    }
    log::info!("Queue performance: {} rows read", rows.len());
    Ok(rows)
}

pub fn read_queue_performance_file(path: &Path) -> AnalysisResult<Vec<QueueIntervalRow>> {
    read_queue_performance(std::fs::File::open(path)?)
}

fn read_text<R: Read>(reader: &mut R) -> AnalysisResult<String> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// `;` unless the header line has more commas than semicolons.
pub fn detect_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or_default();
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();
    if commas > semicolons {
        b','
    } else {
        b';'
    }
}

fn csv_reader_for(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(content))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes())
}
