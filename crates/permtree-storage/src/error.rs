//! Storage error types.

use thiserror::Error;

use permtree_domain::model::Revision;
use permtree_domain::DomainError;

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A write precondition referenced a tuple that is not live.
    #[error("precondition failed: required tuple {tuple} is missing")]
    PreconditionFailed { tuple: String },

    /// A create targeted a tuple that already exists.
    #[error("duplicate tuple: {tuple}")]
    DuplicateTuple { tuple: String },

    /// The supplied revision does not identify a readable snapshot.
    #[error("invalid revision {revision}: {reason}")]
    InvalidRevision { revision: Revision, reason: String },

    /// Invalid input error.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::PreconditionFailed { tuple } => DomainError::PreconditionFailed {
                message: format!("required tuple {tuple} is missing"),
            },
            StorageError::InvalidRevision { revision, reason } => DomainError::InvalidRevision {
                message: format!("{revision}: {reason}"),
            },
            other => DomainError::expansion_failure(other),
        }
    }
}
