//! Domain error types for graph expansion.

use thiserror::Error;

/// Domain-specific errors surfaced by the expansion engine and its
/// collaborators (datastore reads, namespace resolution).
#[derive(Debug, Error)]
pub enum DomainError {
    /// The requested namespace is not defined at the requested revision.
    #[error("namespace not found: {name}")]
    UnknownNamespace { name: String },

    /// The requested relation is not defined on the namespace.
    #[error("relation '{relation}' not found in namespace '{namespace}'")]
    UnknownRelation { namespace: String, relation: String },

    /// A datastore or collaborator failure encountered mid-expansion.
    #[error("error performing expansion: {message}")]
    ExpansionFailure { message: String },

    /// The caller's context was cancelled before the expansion completed.
    #[error("request canceled")]
    RequestCanceled,

    /// The traversal depth budget was exhausted.
    #[error("max depth exceeded: the depth budget for this request was exhausted")]
    MaxDepthExceeded,

    /// Internal contract violation. Reaching this indicates a schema or
    /// engine bug, never a bad request.
    #[error("always fail: {message}")]
    AlwaysFail { message: String },

    /// The supplied revision does not identify a usable snapshot.
    #[error("invalid revision: {message}")]
    InvalidRevision { message: String },

    /// A write precondition did not hold.
    #[error("precondition failed: {message}")]
    PreconditionFailed { message: String },
}

impl DomainError {
    /// Wraps a collaborator failure encountered during expansion.
    pub fn expansion_failure(err: impl std::fmt::Display) -> Self {
        DomainError::ExpansionFailure {
            message: err.to_string(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
