//! The analysis engine.
//!
//! ORDER (one pass over the timeline, shared by every domain):
//!   1. Pick the target date (override, else first parseable date).
//!   2. Keep in-queue entries and resolve end times for every agent.
//!   3. Per domain: roster table -> occupancy -> queue metrics.
//!
//! RULES:
//!   - A missing date aborts the whole run; it is never defaulted.
//!   - Dropped records are counted, logged and reported, never fatal.
//!   - A domain whose roster matches nobody gets an all-zero occupancy.

use crate::{
    config::{AnalysisConfig, DomainConfig},
    date_selector::select_from_columns,
    end_time_resolver::{ResolutionStats, ResolvedTimeline},
    error::AnalysisResult,
    ingest::{QueueIntervalRow, TimelineExport},
    interval_grid::IntervalGrid,
    overlap_accumulator::{OccupancyResult, OverlapAccumulator},
    queue_metrics::{compute_interval_metrics, IntervalMetrics},
    roster::{is_in_queue_state, RosterTable},
    types::DomainName,
};
use chrono::NaiveDate;
use serde::Serialize;

/// Everything read from the two exports.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInputs {
    pub timeline:        TimelineExport,
    pub queue_rows:      Vec<QueueIntervalRow>,
    /// Names the timeline in errors, usually its path.
    pub timeline_source: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainReport {
    pub domain:             DomainName,
    pub label:              String,
    pub date:               NaiveDate,
    pub agents:             usize,
    pub occupancy:          OccupancyResult,
    pub intervals:          Vec<IntervalMetrics>,
    pub roster_ambiguities: usize,
    pub unmatched_members:  Vec<String>,
    /// Records of this domain's agents dropped as malformed or inverted.
    pub dropped_records:    usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub date:    NaiveDate,
    pub stats:   ResolutionStats,
    pub domains: Vec<DomainReport>,
}

pub struct AnalysisEngine {
    config: AnalysisConfig,
}

impl AnalysisEngine {
    pub fn new(config: AnalysisConfig) -> AnalysisResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// The override if given, else the first parseable date of the
    /// interval-start column, then of the start column.
    pub fn target_date(
        &self,
        inputs: &AnalysisInputs,
        date_override: Option<NaiveDate>,
    ) -> AnalysisResult<NaiveDate> {
        if let Some(date) = date_override {
            return Ok(date);
        }
        let columns: Vec<Vec<&str>> = vec![
            inputs.timeline.interval_starts.iter().map(String::as_str).collect(),
            inputs.timeline.entries.iter().map(|e| e.start.as_str()).collect(),
        ];
        let source = if inputs.timeline_source.is_empty() {
            "timeline"
        } else {
            inputs.timeline_source.as_str()
        };
        select_from_columns(&columns, source)
    }

    /// In-queue filter plus end-time resolution, once for all domains.
    pub fn prepare(&self, timeline: &TimelineExport) -> ResolvedTimeline {
        let in_queue: Vec<_> = timeline
            .entries
            .iter()
            .filter(|e| is_in_queue_state(&e.principal_state, &self.config.in_queue_state_keywords))
            .cloned()
            .collect();
        log::info!(
            "{} of {} timeline entries are in-queue",
            in_queue.len(),
            timeline.entries.len()
        );
        ResolvedTimeline::resolve(&in_queue, &self.config.search_window)
    }

    pub fn run(
        &self,
        inputs: &AnalysisInputs,
        date_override: Option<NaiveDate>,
    ) -> AnalysisResult<RunReport> {
        self.run_selected(inputs, date_override, None)
    }

    /// Like `run`, restricted to one domain when `only` is given.
    pub fn run_selected(
        &self,
        inputs: &AnalysisInputs,
        date_override: Option<NaiveDate>,
        only: Option<&str>,
    ) -> AnalysisResult<RunReport> {
        if let Some(name) = only {
            self.config.domain(name)?;
        }
        let date = self.target_date(inputs, date_override)?;
        log::info!("Target date: {date}");

        let resolved = self.prepare(&inputs.timeline);
        let grid = IntervalGrid::for_date(date);

        let domains = self
            .config
            .domains
            .iter()
            .filter(|d| only.map_or(true, |name| d.name == name))
            .map(|domain| self.analyse_domain(domain, &resolved, &grid, &inputs.queue_rows))
            .collect();

        Ok(RunReport {
            date,
            stats: resolved.stats(),
            domains,
        })
    }

    pub fn run_domain(
        &self,
        name: &str,
        inputs: &AnalysisInputs,
        date_override: Option<NaiveDate>,
    ) -> AnalysisResult<DomainReport> {
        let domain = self.config.domain(name)?;
        let date = self.target_date(inputs, date_override)?;
        let resolved = self.prepare(&inputs.timeline);
        let grid = IntervalGrid::for_date(date);
        Ok(self.analyse_domain(domain, &resolved, &grid, &inputs.queue_rows))
    }

    /// Occupancy over the resolved records of the roster's agents.
    pub fn domain_occupancy(
        &self,
        roster: &RosterTable,
        resolved: &ResolvedTimeline,
        grid: &IntervalGrid,
    ) -> OccupancyResult {
        let mut acc = OverlapAccumulator::new(grid, self.config.dwell_threshold_minutes);
        for agent in roster.agents() {
            acc.extend(resolved.records_for(agent));
        }
        acc.finish()
    }

    fn analyse_domain(
        &self,
        domain: &DomainConfig,
        resolved: &ResolvedTimeline,
        grid: &IntervalGrid,
        queue_rows: &[QueueIntervalRow],
    ) -> DomainReport {
        let roster = RosterTable::for_timeline(&domain.roster, resolved);
        if roster.is_empty() {
            log::warn!("[{}] no agents matched the roster; occupancy is zero", domain.name);
        }
        for alias in roster.unmatched_members() {
            log::debug!("[{}] roster alias '{alias}' not present in timeline", domain.name);
        }

        let dropped_records = resolved
            .issues()
            .iter()
            .filter(|issue| roster.contains(&issue.agent))
            .count();

        let occupancy = self.domain_occupancy(&roster, resolved, grid);
        let intervals = compute_interval_metrics(domain, queue_rows, grid.date(), &occupancy);

        log::info!(
            "[{}] {} agents, {} active buckets, {} report intervals, {} dropped records",
            domain.name,
            roster.len(),
            occupancy.active_buckets(),
            intervals.len(),
            dropped_records
        );

        DomainReport {
            domain: domain.name.clone(),
            label: domain.label.clone(),
            date: grid.date(),
            agents: roster.len(),
            occupancy,
            intervals,
            roster_ambiguities: roster.ambiguities().len(),
            unmatched_members: roster.unmatched_members().to_vec(),
            dropped_records,
        }
    }
}
