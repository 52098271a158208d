//! Shared primitive types and constants used across the analysis.

/// Agent identity as it appears in the timeline export.
pub type AgentId = String;

/// A bucket label in `HH:MM-HH:MM` form. The last one is `23:30-00:00`.
pub type BucketLabel = String;

/// Name of an analysis domain (queue group), e.g. `help_desk`.
pub type DomainName = String;

/// Minimum overlap, in minutes, for an agent to count as present in a bucket.
pub const DWELL_THRESHOLD_MINUTES: i64 = 5;

/// Implied-end search window: a later start qualifies when it falls more than
/// `.0` and at most `.1` minutes after the open entry's start.
pub const END_TIME_SEARCH_WINDOW_MINUTES: (i64, i64) = (1, 180);

pub const BUCKET_MINUTES: i64 = 30;
pub const BUCKETS_PER_DAY: usize = 48;

/// Timeline export timestamps, e.g. `19/10/25 07:54:42`.
pub const TIMELINE_TIMESTAMP_FORMAT: &str = "%d/%m/%y %H:%M:%S";

/// Queue performance interval bounds, e.g. `19/10/25 07:30`.
pub const INTERVAL_TIMESTAMP_FORMAT: &str = "%d/%m/%y %H:%M";

/// Date portion shared by both exports.
pub const EXPORT_DATE_FORMAT: &str = "%d/%m/%y";
