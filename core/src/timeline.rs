//! Timeline records: raw entries from the export and their resolved form.

use crate::types::AgentId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One observed status change, as exported. Timestamps stay raw strings
/// until resolution; the end may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTimelineEntry {
    pub agent:           AgentId,
    pub principal_state: String,
    pub start:           String,
    pub end:             String,
    #[serde(default)]
    pub division:        Option<String>,
}

impl RawTimelineEntry {
    pub fn new(
        agent: impl Into<String>,
        principal_state: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            agent:           agent.into(),
            principal_state: principal_state.into(),
            start:           start.into(),
            end:             end.into(),
            division:        None,
        }
    }

    pub fn has_end(&self) -> bool {
        !self.end.trim().is_empty()
    }
}

/// How a record's end was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndResolution {
    /// The export carried the end.
    Recorded,
    /// Adopted from a peer entry with the identical start.
    SameStartPeer,
    /// Implied by the earliest later start inside the search window.
    NextStart,
    /// Nothing found; truncated to 23:59:59 of the start's own date.
    EndOfDay,
}

/// A timeline entry with both endpoints known. `end >= start` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRecord {
    pub agent:      AgentId,
    pub start:      NaiveDateTime,
    pub end:        NaiveDateTime,
    pub resolution: EndResolution,
}

impl ResolvedRecord {
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}
