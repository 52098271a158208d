//! Per-interval queue metrics for one domain.
//!
//! Rows of the domain's queues are summed per half-hour bucket of the target
//! date and joined with the domain's connected-agent counts.

use crate::{
    clock::{format_hms, parse_interval_timestamp},
    config::DomainConfig,
    ingest::QueueIntervalRow,
    interval_grid::{bucket_index, bucket_label},
    overlap_accumulator::OccupancyResult,
    types::BucketLabel,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

const LOW_SERVICE_LEVEL_PCT: f64 = 5.0;
const FALLBACK_ANSWER_RATE_PCT: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalMetrics {
    #[serde(rename = "Interval")]
    pub interval: BucketLabel,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Offered")]
    pub offered: u64,
    #[serde(rename = "Answered")]
    pub answered: u64,
    #[serde(rename = "Abandoned")]
    pub abandoned: u64,
    #[serde(rename = "AnsweredWithinSla")]
    pub within_sla: u64,
    #[serde(rename = "Retained")]
    pub retained: u64,
    /// Outbound calls placed (`Contactando`).
    #[serde(rename = "OutboundCalls")]
    pub outbound_calls: u64,
    #[serde(rename = "AnswerRatePct")]
    pub answer_rate_pct: f64,
    #[serde(rename = "ServiceLevelPct")]
    pub service_level_pct: f64,
    #[serde(rename = "AbandonRatePct")]
    pub abandon_rate_pct: f64,
    #[serde(rename = "RetentionPct")]
    pub retention_pct: f64,
    #[serde(rename = "AHT")]
    pub aht: String,
    #[serde(rename = "AhtSeconds")]
    pub aht_seconds: f64,
    #[serde(rename = "ConnectedAgents")]
    pub connected_agents: u32,
    /// Answered calls per connected agent.
    #[serde(rename = "CallsPerAgent")]
    pub calls_per_agent: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct IntervalTotals {
    offered:        u64,
    answered:       u64,
    abandoned:      u64,
    within_sla:     u64,
    retained:       u64,
    outbound_calls: u64,
    handle_seconds: f64,
    handled_calls:  f64,
}

impl IntervalTotals {
    fn add(&mut self, row: &QueueIntervalRow) {
        self.offered += row.offered;
        self.answered += row.answered;
        self.abandoned += row.abandoned;
        self.within_sla += row.within_sla;
        self.retained += row.retained;
        self.outbound_calls += row.contacted;

        // Handled calls are recovered as total / average.
        let total = parse_handle_seconds(&row.handle_total);
        let average = parse_handle_seconds(&row.handle_average);
        if total > 0.0 && average > 0.0 {
            self.handle_seconds += total;
            self.handled_calls += total / average;
        }
    }

    fn aht_seconds(&self) -> f64 {
        if self.handled_calls > 0.0 {
            self.handle_seconds / self.handled_calls
        } else {
            0.0
        }
    }
}

/// Seconds from `"Xm Ys"`, `"Xm"`, `"Ys"` or a plain number. Anything
/// unparseable is 0.
pub fn parse_handle_seconds(raw: &str) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0.0;
    }
    if let Ok(v) = raw.parse::<f64>() {
        return if v.is_finite() && v > 0.0 { v } else { 0.0 };
    }

    let (minutes, rest) = match raw.split_once('m') {
        Some((m, rest)) => match m.trim().parse::<f64>() {
            Ok(m) => (m, rest),
            Err(_) => return 0.0,
        },
        None => (0.0, raw),
    };
    let rest = rest.trim();
    let seconds = if rest.is_empty() {
        0.0
    } else {
        match rest.trim_end_matches('s').trim().parse::<f64>() {
            Ok(s) => s,
            Err(_) => return 0.0,
        }
    };
    (minutes * 60.0 + seconds).max(0.0)
}

fn pct(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        round2(numerator as f64 / denominator as f64 * 100.0)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// True for rows that belong to `domain`. Consolidated multi-queue rows
/// (names joined with `;`) never count.
pub fn is_domain_queue(domain: &DomainConfig, queue: &str) -> bool {
    !queue.contains(';') && domain.queues.iter().any(|q| q == queue)
}

/// Metrics for every bucket of `date` that has rows for the domain's queues,
/// in grid order.
pub fn compute_interval_metrics(
    domain: &DomainConfig,
    rows: &[QueueIntervalRow],
    date: NaiveDate,
    occupancy: &OccupancyResult,
) -> Vec<IntervalMetrics> {
    let mut totals: BTreeMap<usize, IntervalTotals> = BTreeMap::new();

    for row in rows.iter().filter(|r| is_domain_queue(domain, &r.queue)) {
        let Some(start) = parse_interval_timestamp(&row.interval_start) else {
            log::warn!(
                "[{}] skipping row for {} with malformed interval start '{}'",
                domain.name,
                row.queue,
                row.interval_start
            );
            continue;
        };
        if start.date() != date {
            log::debug!(
                "[{}] skipping row for {} dated {}",
                domain.name,
                row.queue,
                start.date()
            );
            continue;
        }
        totals.entry(bucket_index(start.time())).or_default().add(row);
    }

    totals
        .into_iter()
        .map(|(index, t)| {
            let label = bucket_label(index);
            let answer_rate_pct = pct(t.answered, t.offered);
            let mut service_level_pct = pct(t.within_sla, t.offered);
            if domain.low_service_level_fallback
                && service_level_pct < LOW_SERVICE_LEVEL_PCT
                && answer_rate_pct > FALLBACK_ANSWER_RATE_PCT
            {
                log::info!(
                    "[{}] {label}: service level {service_level_pct:.2}% too low, reporting answer rate {answer_rate_pct:.2}%",
                    domain.name
                );
                service_level_pct = answer_rate_pct;
            }

            let aht_seconds = t.aht_seconds();
            let connected_agents = occupancy.count_for(&label);
            let calls_per_agent = if connected_agents > 0 {
                round2(t.answered as f64 / connected_agents as f64)
            } else {
                0.0
            };

            IntervalMetrics {
                interval: label,
                date,
                offered: t.offered,
                answered: t.answered,
                abandoned: t.abandoned,
                within_sla: t.within_sla,
                retained: t.retained,
                outbound_calls: t.outbound_calls,
                answer_rate_pct,
                service_level_pct,
                abandon_rate_pct: pct(t.abandoned, t.offered),
                retention_pct: pct(t.retained, t.answered),
                aht: format_hms(aht_seconds),
                aht_seconds: aht_seconds.round(),
                connected_agents,
                calls_per_agent,
            }
        })
        .collect()
}
