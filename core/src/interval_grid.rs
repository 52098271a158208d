//! The 48 half-hour buckets of a target day.

use crate::{
    clock::{end_of_day, start_of_day},
    types::{BucketLabel, BUCKETS_PER_DAY, BUCKET_MINUTES},
};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntervalBucket {
    pub label:        BucketLabel,
    /// Offset of the bucket start from midnight.
    #[serde(skip)]
    pub start_of_day: Duration,
    #[serde(skip)]
    pub end_of_day:   Duration,
}

/// Label for the bucket at `index` (0..48). Midnight rollover renders as
/// `00:00`, so the last label is `23:30-00:00`.
pub fn bucket_label(index: usize) -> BucketLabel {
    let start = index as i64 * BUCKET_MINUTES;
    let end = start + BUCKET_MINUTES;
    format!(
        "{:02}:{:02}-{:02}:{:02}",
        start / 60,
        start % 60,
        (end / 60) % 24,
        end % 60
    )
}

/// Index of the bucket containing a time of day.
pub fn bucket_index(time: NaiveTime) -> usize {
    let minutes = time.hour() as i64 * 60 + time.minute() as i64;
    (minutes / BUCKET_MINUTES) as usize
}

/// Label of the bucket containing a time of day.
pub fn label_for_time(time: NaiveTime) -> BucketLabel {
    bucket_label(bucket_index(time))
}

/// Where an instant sits relative to the grid's day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridPosition {
    BeforeDay,
    Within(usize),
    AfterDay,
}

#[derive(Debug, Clone)]
pub struct IntervalGrid {
    date:    NaiveDate,
    buckets: Vec<IntervalBucket>,
}

impl IntervalGrid {
    pub fn for_date(date: NaiveDate) -> Self {
        let buckets = (0..BUCKETS_PER_DAY)
            .map(|i| {
                let start = Duration::minutes(i as i64 * BUCKET_MINUTES);
                IntervalBucket {
                    label:        bucket_label(i),
                    start_of_day: start,
                    end_of_day:   start + Duration::minutes(BUCKET_MINUTES),
                }
            })
            .collect();
        Self { date, buckets }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn buckets(&self) -> &[IntervalBucket] {
        &self.buckets
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|b| b.label.as_str())
    }

    pub fn bucket_start(&self, index: usize) -> NaiveDateTime {
        self.day_start() + self.buckets[index].start_of_day
    }

    pub fn bucket_end(&self, index: usize) -> NaiveDateTime {
        self.day_start() + self.buckets[index].end_of_day
    }

    pub fn day_start(&self) -> NaiveDateTime {
        start_of_day(self.date)
    }

    /// Last counted instant of the day, 23:59:59.
    pub fn day_end(&self) -> NaiveDateTime {
        end_of_day(self.date)
    }

    pub fn locate(&self, instant: NaiveDateTime) -> GridPosition {
        let date = instant.date();
        if date < self.date {
            GridPosition::BeforeDay
        } else if date > self.date {
            GridPosition::AfterDay
        } else {
            GridPosition::Within(bucket_index(instant.time()))
        }
    }

    /// Restrict `[start, end)` to the target day. A record starting the day
    /// before is cut at 00:00; one running into the next day is cut at
    /// 23:59:59. `None` when nothing of it lies on the target day.
    pub fn clip(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let from = match self.locate(start) {
            GridPosition::AfterDay  => return None,
            GridPosition::BeforeDay => self.day_start(),
            GridPosition::Within(_) => start,
        };
        let to = match self.locate(end) {
            GridPosition::BeforeDay => return None,
            GridPosition::AfterDay  => self.day_end(),
            GridPosition::Within(_) => end,
        };
        (to > from).then_some((from, to))
    }

    /// Buckets that an already clipped span can overlap.
    pub fn span(&self, from: NaiveDateTime, to: NaiveDateTime) -> Range<usize> {
        let first = match self.locate(from) {
            GridPosition::Within(i) => i,
            GridPosition::BeforeDay => 0,
            GridPosition::AfterDay  => return 0..0,
        };
        let last = match self.locate(to) {
            GridPosition::Within(i) => i,
            GridPosition::AfterDay  => BUCKETS_PER_DAY - 1,
            GridPosition::BeforeDay => return 0..0,
        };
        first..(last + 1).min(BUCKETS_PER_DAY)
    }
}
