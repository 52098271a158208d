//! Call-center interval analysis: per half-hour connected-agent occupancy
//! from agent status timelines, joined with queue performance exports.

pub mod clock;
pub mod config;
pub mod date_selector;
pub mod end_time_resolver;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod interval_grid;
pub mod occupancy;
pub mod overlap_accumulator;
pub mod queue_metrics;
pub mod report;
pub mod roster;
pub mod timeline;
pub mod types;
