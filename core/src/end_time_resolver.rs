//! End-time resolution.
//!
//! For each agent, entries missing an end are repaired in this order:
//!   1. a peer with the identical start and a recorded end donates it
//!      (earliest such end when several exist);
//!   2. otherwise the earliest peer start inside the search window
//!      `(min, max]` minutes after this start becomes the end;
//!   3. otherwise the shift is truncated to 23:59:59 of its own date.
//!
//! Unparseable timestamps and inverted intervals drop the record and are
//! reported as data-quality issues. Nothing here is fatal.

use crate::{
    clock::{end_of_day, format_timeline_timestamp, parse_timeline_timestamp},
    config::SearchWindow,
    error::RecordError,
    timeline::{EndResolution, RawTimelineEntry, ResolvedRecord},
    types::AgentId,
};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A dropped record and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIssue {
    pub agent: AgentId,
    pub error: RecordError,
}

/// Output of resolving one agent's entries.
#[derive(Debug, Default, Clone)]
pub struct AgentResolution {
    pub records: Vec<ResolvedRecord>,
    pub issues:  Vec<RecordIssue>,
}

/// Entry with its start parsed. `end` is `None` when the export left it empty.
struct ParsedEntry {
    start: NaiveDateTime,
    end:   Option<NaiveDateTime>,
}

/// Resolve every entry of a single agent. Entries are expected to be
/// pre-filtered to that agent; the agent name on each output record is taken
/// from its own entry.
pub fn resolve_agent(entries: &[&RawTimelineEntry], window: &SearchWindow) -> AgentResolution {
    let mut out = AgentResolution::default();

    // Parse pass. Entries with a valid start but malformed end still mark a
    // status change, so they stay usable as implied-end candidates.
    let mut starts: Vec<NaiveDateTime> = Vec::with_capacity(entries.len());
    let mut parsed: Vec<(usize, &RawTimelineEntry, ParsedEntry)> = Vec::with_capacity(entries.len());

    for &entry in entries {
        let Some(start) = parse_timeline_timestamp(&entry.start) else {
            out.issues.push(malformed(entry, "start", &entry.start));
            continue;
        };
        let start_idx = starts.len();
        starts.push(start);

        let end = if entry.has_end() {
            match parse_timeline_timestamp(&entry.end) {
                Some(end) => Some(end),
                None => {
                    out.issues.push(malformed(entry, "end", &entry.end));
                    continue;
                }
            }
        } else {
            None
        };
        parsed.push((start_idx, entry, ParsedEntry { start, end }));
    }

    for (idx, (start_idx, entry, current)) in parsed.iter().enumerate() {
        let (end, resolution) = match current.end {
            Some(end) => (end, EndResolution::Recorded),
            None => {
                let same_start = parsed
                    .iter()
                    .enumerate()
                    .filter(|(other, (_, _, p))| *other != idx && p.start == current.start)
                    .filter_map(|(_, (_, _, p))| p.end)
                    .min();

                if let Some(end) = same_start {
                    (end, EndResolution::SameStartPeer)
                } else if let Some(end) = earliest_next_start(&starts, *start_idx, current.start, window) {
                    (end, EndResolution::NextStart)
                } else {
                    (end_of_day(current.start.date()), EndResolution::EndOfDay)
                }
            }
        };

        if end < current.start {
            log::warn!(
                "Dropping inverted interval for {}: {} -> {}",
                entry.agent,
                entry.start,
                format_timeline_timestamp(end)
            );
            out.issues.push(RecordIssue {
                agent: entry.agent.clone(),
                error: RecordError::InvertedInterval {
                    agent: entry.agent.clone(),
                    start: entry.start.clone(),
                    end:   format_timeline_timestamp(end),
                },
            });
            continue;
        }

        out.records.push(ResolvedRecord {
            agent: entry.agent.clone(),
            start: current.start,
            end,
            resolution,
        });
    }

    out
}

fn malformed(entry: &RawTimelineEntry, field: &'static str, value: &str) -> RecordIssue {
    log::warn!("Dropping record for {}: malformed {field} '{value}'", entry.agent);
    RecordIssue {
        agent: entry.agent.clone(),
        error: RecordError::MalformedTimestamp {
            field,
            value: value.to_string(),
        },
    }
}

/// Earliest start among the other entries that falls inside the window.
fn earliest_next_start(
    starts: &[NaiveDateTime],
    own_idx: usize,
    start: NaiveDateTime,
    window: &SearchWindow,
) -> Option<NaiveDateTime> {
    let min_gap = Duration::minutes(window.min_exclusive_minutes);
    let max_gap = Duration::minutes(window.max_inclusive_minutes);
    starts
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != own_idx)
        .map(|(_, s)| *s)
        .filter(|s| {
            let gap = *s - start;
            gap > min_gap && gap <= max_gap
        })
        .min()
}

/// Per-resolution counters for the run summary.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionStats {
    pub recorded:        usize,
    pub same_start_peer: usize,
    pub next_start:      usize,
    pub end_of_day:      usize,
    pub malformed:       usize,
    pub inverted:        usize,
}

/// Every agent's resolved records, computed once and shared by all domains.
#[derive(Debug, Default, Clone)]
pub struct ResolvedTimeline {
    records:   BTreeMap<AgentId, Vec<ResolvedRecord>>,
    divisions: BTreeMap<AgentId, BTreeSet<String>>,
    issues:    Vec<RecordIssue>,
}

impl ResolvedTimeline {
    /// Group `entries` by agent (input order kept within an agent) and
    /// resolve each group.
    pub fn resolve(entries: &[RawTimelineEntry], window: &SearchWindow) -> Self {
        let mut grouped: BTreeMap<&str, Vec<&RawTimelineEntry>> = BTreeMap::new();
        for entry in entries {
            grouped.entry(entry.agent.as_str()).or_default().push(entry);
        }

        let mut timeline = Self::default();
        for (agent, agent_entries) in grouped {
            let divisions: BTreeSet<String> = agent_entries
                .iter()
                .filter_map(|e| e.division.clone())
                .collect();
            if !divisions.is_empty() {
                timeline.divisions.insert(agent.to_string(), divisions);
            }

            let resolution = resolve_agent(&agent_entries, window);
            timeline.issues.extend(resolution.issues);
            timeline.records.insert(agent.to_string(), resolution.records);
        }

        log::debug!(
            "Resolved {} records for {} agents ({} dropped)",
            timeline.record_count(),
            timeline.records.len(),
            timeline.issues.len()
        );
        timeline
    }

    pub fn agents(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn records_for(&self, agent: &str) -> &[ResolvedRecord] {
        self.records.get(agent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_records(&self) -> impl Iterator<Item = &ResolvedRecord> {
        self.records.values().flatten()
    }

    pub fn divisions_for(&self, agent: &str) -> Option<&BTreeSet<String>> {
        self.divisions.get(agent)
    }

    pub fn issues(&self) -> &[RecordIssue] {
        &self.issues
    }

    pub fn record_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn stats(&self) -> ResolutionStats {
        let mut stats = ResolutionStats::default();
        for record in self.all_records() {
            match record.resolution {
                EndResolution::Recorded      => stats.recorded += 1,
                EndResolution::SameStartPeer => stats.same_start_peer += 1,
                EndResolution::NextStart     => stats.next_start += 1,
                EndResolution::EndOfDay      => stats.end_of_day += 1,
            }
        }
        for issue in &self.issues {
            match issue.error {
                RecordError::MalformedTimestamp { .. } => stats.malformed += 1,
                RecordError::InvertedInterval { .. }   => stats.inverted += 1,
            }
        }
        stats
    }
}
