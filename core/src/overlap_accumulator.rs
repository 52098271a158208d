//! Intersects resolved records with the grid and counts distinct agents
//! present for at least the dwell threshold in each bucket.

use crate::{
    interval_grid::IntervalGrid,
    timeline::ResolvedRecord,
    types::{AgentId, BucketLabel},
};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub label:  BucketLabel,
    pub agents: u32,
}

/// Distinct-agent count per bucket. Always carries all 48 labels, in grid
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupancyResult {
    pub date:    NaiveDate,
    pub buckets: Vec<BucketCount>,
}

impl OccupancyResult {
    pub fn get(&self, label: &str) -> Option<u32> {
        self.buckets.iter().find(|b| b.label == label).map(|b| b.agents)
    }

    /// Count for `label`, 0 for an unknown label.
    pub fn count_for(&self, label: &str) -> u32 {
        self.get(label).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.buckets.iter().map(|b| (b.label.as_str(), b.agents))
    }

    pub fn to_map(&self) -> BTreeMap<BucketLabel, u32> {
        self.buckets.iter().map(|b| (b.label.clone(), b.agents)).collect()
    }

    /// Busiest bucket; the earliest wins a tie.
    pub fn peak(&self) -> Option<&BucketCount> {
        self.buckets
            .iter()
            .filter(|b| b.agents > 0)
            .fold(None, |best: Option<&BucketCount>, b| match best {
                Some(cur) if cur.agents >= b.agents => Some(cur),
                _ => Some(b),
            })
    }

    pub fn active_buckets(&self) -> usize {
        self.buckets.iter().filter(|b| b.agents > 0).count()
    }
}

pub struct OverlapAccumulator<'g> {
    grid:     &'g IntervalGrid,
    dwell:    Duration,
    presence: Vec<BTreeSet<AgentId>>,
}

impl<'g> OverlapAccumulator<'g> {
    pub fn new(grid: &'g IntervalGrid, dwell_threshold_minutes: i64) -> Self {
        Self {
            grid,
            dwell: Duration::minutes(dwell_threshold_minutes),
            presence: vec![BTreeSet::new(); grid.buckets().len()],
        }
    }

    /// Per-bucket overlap of `record` with the target day, for buckets it
    /// touches. Zero-length overlaps are omitted.
    pub fn overlaps(&self, record: &ResolvedRecord) -> Vec<(usize, Duration)> {
        let Some((from, to)) = self.grid.clip(record.start, record.end) else {
            return Vec::new();
        };
        self.grid
            .span(from, to)
            .filter_map(|i| {
                let lo = from.max(self.grid.bucket_start(i));
                let hi = to.min(self.grid.bucket_end(i));
                (hi > lo).then_some((i, hi - lo))
            })
            .collect()
    }

    /// Mark the record's agent present in every bucket it covers for at
    /// least the dwell threshold. Repeat presence is idempotent.
    pub fn add(&mut self, record: &ResolvedRecord) {
        for (i, overlap) in self.overlaps(record) {
            if overlap >= self.dwell && !self.presence[i].contains(&record.agent) {
                self.presence[i].insert(record.agent.clone());
            }
        }
    }

    pub fn extend<'r, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'r ResolvedRecord>,
    {
        for record in records {
            self.add(record);
        }
    }

    pub fn finish(self) -> OccupancyResult {
        let buckets = self
            .grid
            .buckets()
            .iter()
            .zip(self.presence)
            .map(|(bucket, agents)| BucketCount {
                label:  bucket.label.clone(),
                agents: agents.len() as u32,
            })
            .collect();
        OccupancyResult {
            date: self.grid.date(),
            buckets,
        }
    }
}

/// One-shot accumulation over a set of records.
pub fn accumulate<'r, I>(grid: &IntervalGrid, records: I, dwell_threshold_minutes: i64) -> OccupancyResult
where
    I: IntoIterator<Item = &'r ResolvedRecord>,
{
    let mut acc = OverlapAccumulator::new(grid, dwell_threshold_minutes);
    acc.extend(records);
    acc.finish()
}
