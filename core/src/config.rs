use crate::{
    error::{AnalysisError, AnalysisResult},
    types::{DomainName, DWELL_THRESHOLD_MINUTES, END_TIME_SEARCH_WINDOW_MINUTES},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Window for inferring an implied end from a later start: the gap must be
/// greater than `min_exclusive_minutes` and at most `max_inclusive_minutes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchWindow {
    pub min_exclusive_minutes: i64,
    pub max_inclusive_minutes: i64,
}

impl Default for SearchWindow {
    fn default() -> Self {
        Self {
            min_exclusive_minutes: END_TIME_SEARCH_WINDOW_MINUTES.0,
            max_inclusive_minutes: END_TIME_SEARCH_WINDOW_MINUTES.1,
        }
    }
}

/// Which agents belong to a domain.
///
/// `members` and `excluded` are aliases matched by substring containment
/// against the raw agent name; an empty `members` list admits everyone.
/// `division` is a case-insensitive substring of the division column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub excluded: Vec<String>,
    #[serde(default)]
    pub division: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    pub name: DomainName,
    pub label: String,
    /// Queue names in the performance export, matched exactly.
    pub queues: Vec<String>,
    pub roster: Roster,
    pub output_file: String,
    /// Report answer rate as service level when SL < 5% and answer rate > 20%.
    #[serde(default)]
    pub low_service_level_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_dwell")]
    pub dwell_threshold_minutes: i64,
    #[serde(default)]
    pub search_window: SearchWindow,
    #[serde(default = "default_state_keywords")]
    pub in_queue_state_keywords: Vec<String>,
    pub domains: Vec<DomainConfig>,
}

fn default_dwell() -> i64 {
    DWELL_THRESHOLD_MINUTES
}

fn default_state_keywords() -> Vec<String> {
    vec!["queue".into()]
}

impl AnalysisConfig {
    /// Load from a JSON file.
    /// In tests, use AnalysisConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config = Self::from_json_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot load {path}: {e}"))?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> AnalysisResult<Self> {
        let config: AnalysisConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        if self.dwell_threshold_minutes <= 0 {
            return Err(invalid("dwell_threshold_minutes must be positive"));
        }
        let w = &self.search_window;
        if w.min_exclusive_minutes < 0 || w.max_inclusive_minutes <= w.min_exclusive_minutes {
            return Err(invalid("search_window must satisfy 0 <= min < max"));
        }
        if self.in_queue_state_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(invalid("in_queue_state_keywords must not be empty"));
        }
        let mut seen = HashSet::new();
        for domain in &self.domains {
            if !seen.insert(domain.name.as_str()) {
                return Err(invalid(&format!("duplicate domain '{}'", domain.name)));
            }
            if domain.queues.is_empty() {
                log::warn!("Domain '{}' lists no queues; its report will be empty", domain.name);
            }
        }
        Ok(())
    }

    pub fn domain(&self, name: &str) -> AnalysisResult<&DomainConfig> {
        self.domains
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| AnalysisError::UnknownDomain { name: name.to_string() })
    }

    /// Deterministic config for tests: two domains, one selected by
    /// division, one by an explicit member list.
    pub fn default_test() -> Self {
        Self {
            dwell_threshold_minutes: DWELL_THRESHOLD_MINUTES,
            search_window: SearchWindow::default(),
            in_queue_state_keywords: vec!["queue".into(), "cola".into()],
            domains: vec![
                DomainConfig {
                    name: "help_desk".into(),
                    label: "Help Desk".into(),
                    queues: vec!["MA_Credito".into(), "MA_Debito".into()],
                    roster: Roster {
                        members: Vec::new(),
                        excluded: vec!["AG0301".into()],
                        division: Some("supervisor_ma".into()),
                    },
                    output_file: "help_desk_intervals.csv".into(),
                    low_service_level_fallback: true,
                },
                DomainConfig {
                    name: "fraud".into(),
                    label: "Fraud".into(),
                    queues: vec!["Fraude".into(), "Fraude_MA".into()],
                    roster: Roster {
                        members: vec!["AG0101".into(), "AG0102".into()],
                        excluded: Vec::new(),
                        division: None,
                    },
                    output_file: "fraud_intervals.csv".into(),
                    low_service_level_fallback: false,
                },
            ],
        }
    }
}

fn invalid(reason: &str) -> AnalysisError {
    AnalysisError::InvalidConfig { reason: reason.to_string() }
}
