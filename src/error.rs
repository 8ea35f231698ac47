// src/error.rs - Error types for the recognition core and session plumbing
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// The sequence window was read before it held a full window of frames.
    #[error("sequence buffer not full yet: {have} of {need} frames")]
    InsufficientData { have: usize, need: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("replay line {line}: {source}")]
    Replay {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("ingest pipeline failed: {0}")]
    Pipeline(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
