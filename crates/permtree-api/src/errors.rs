//! Error classification for API responses.
//!
//! Domain and storage errors are folded into a small set of wire codes, each
//! carrying an HTTP status. The JSON error body is `{"code", "message"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use permtree_domain::DomainError;
use permtree_storage::StorageError;

/// Wire-level error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request itself is malformed.
    InvalidArgument,
    /// The request references namespaces, relations, or tuples that do not
    /// exist.
    FailedPrecondition,
    /// The supplied revision does not identify a usable snapshot.
    OutOfRange,
    /// The request was cancelled before completion.
    Canceled,
    /// Unexpected server-side failure.
    Internal,
}

impl ErrorCode {
    fn status(self) -> StatusCode {
        match self {
            ErrorCode::InvalidArgument | ErrorCode::OutOfRange => StatusCode::BAD_REQUEST,
            ErrorCode::FailedPrecondition => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::Canceled => StatusCode::REQUEST_TIMEOUT,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// An error ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidArgument,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Internal,
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: ErrorCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let body = ErrorBody {
            code: self.code,
            message: self.message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let code = match err {
            DomainError::UnknownNamespace { .. }
            | DomainError::UnknownRelation { .. }
            | DomainError::PreconditionFailed { .. } => ErrorCode::FailedPrecondition,
            DomainError::InvalidRevision { .. } => ErrorCode::OutOfRange,
            DomainError::RequestCanceled => ErrorCode::Canceled,
            DomainError::ExpansionFailure { .. }
            | DomainError::MaxDepthExceeded
            | DomainError::AlwaysFail { .. } => ErrorCode::Internal,
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        let code = match err {
            StorageError::PreconditionFailed { .. } | StorageError::DuplicateTuple { .. } => {
                ErrorCode::FailedPrecondition
            }
            StorageError::InvalidRevision { .. } => ErrorCode::OutOfRange,
            StorageError::InvalidInput { .. } => ErrorCode::InvalidArgument,
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_classification() {
        let err = ApiError::from(DomainError::UnknownNamespace {
            name: "folder".to_string(),
        });
        assert_eq!(err.code, ErrorCode::FailedPrecondition);
        assert_eq!(err.code.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = ApiError::from(DomainError::RequestCanceled);
        assert_eq!(err.code, ErrorCode::Canceled);

        let err = ApiError::from(DomainError::MaxDepthExceeded);
        assert_eq!(err.code, ErrorCode::Internal);

        let err = ApiError::from(DomainError::InvalidRevision {
            message: "stale".to_string(),
        });
        assert_eq!(err.code, ErrorCode::OutOfRange);
    }

    #[test]
    fn test_storage_error_classification() {
        let err = ApiError::from(StorageError::InvalidInput {
            message: "empty".to_string(),
        });
        assert_eq!(err.code, ErrorCode::InvalidArgument);

        let err = ApiError::from(StorageError::PreconditionFailed {
            tuple: "folder:x#owner@user:y#...".to_string(),
        });
        assert_eq!(err.code, ErrorCode::FailedPrecondition);
    }
}
