//! Fatal pipeline errors
//!
//! Everything in here stops the run. Per-record problems (a missing file, a
//! failed upload) never become a `PipelineError`; the stage that hits them
//! logs, counts and drops the record.

use crate::store::RecordId;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to open record store at {path}")]
    OpenStore {
        path: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Record store {operation} failed")]
    RecordStore {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to persist location for record {record_id}")]
    Persist {
        record_id: RecordId,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("Object storage setup failed")]
    Storage(#[source] anyhow::Error),

    #[error("{stage} worker panicked: {message}")]
    WorkerPanicked { stage: &'static str, message: String },

    #[error("{stage} stage stopped before its input was exhausted")]
    StageClosed { stage: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn record_store(operation: &'static str, source: sqlx::Error) -> Self {
        Self::RecordStore { operation, source }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
