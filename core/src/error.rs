use thiserror::Error;

/// Fatal errors. Any of these aborts the run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No parseable date found in {source_name}; refusing to report an all-zero day")]
    NoDateDetected { source_name: String },

    #[error("Domain '{name}' not found in configuration")]
    UnknownDomain { name: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Per-record data-quality problems. The record is dropped and the run
/// continues; these never propagate to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Malformed {field} timestamp '{value}'")]
    MalformedTimestamp { field: &'static str, value: String },

    #[error("Inverted interval for {agent}: end {end} precedes start {start}")]
    InvertedInterval {
        agent: String,
        start: String,
        end:   String,
    },
}
