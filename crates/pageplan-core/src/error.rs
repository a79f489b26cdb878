//! Shared error type for the core crates.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid page {page_number}: {reason}")]
    InvalidPage { page_number: u32, reason: String },

    #[error("invalid document id: {0}")]
    InvalidDocumentId(String),

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
