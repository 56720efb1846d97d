//! Error types for the store index, ingestion pipeline and query engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unknown store id, or a query bucket with no candidates.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("store {0} already exists")]
    AlreadyExists(u32),

    /// Bucket-key derivation failed for a coordinate pair.
    #[error("error encoding lat/long: {0}")]
    Encoding(String),

    #[error("invalid bucket key: {0}")]
    InvalidBucketKey(String),

    /// A single source element could not be converted into a store record.
    #[error("error decoding store record: {0}")]
    Decoding(String),

    #[error("record source not found: {0}")]
    SourceNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Structural failure of the top-level JSON document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("error geocoding: {0}")]
    Geocode(String),

    #[error("distance calculation did not converge after {iterations} iterations")]
    DistanceDidNotConverge { iterations: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("ingestion cancelled")]
    Cancelled,

    #[error("pipeline task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// Returns true for failures the ingestion pipeline skips instead of aborting on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StoreError::AlreadyExists(_) | StoreError::Encoding(_) | StoreError::Decoding(_)
        )
    }
}
