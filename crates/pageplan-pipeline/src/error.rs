//! Pipeline error handling.

use thiserror::Error;

/// Failure writing to or reading from the repository port. The caller is
/// expected to retry; all writes are idempotent upserts.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage failure: {0}")]
    Storage(String),

    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid page {page_number}: {reason}")]
    InvalidPage { page_number: u32, reason: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
