//! Custom error types for the cinevault API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the API service
///
/// The authentication failures (`Unauthenticated`, `InvalidToken`,
/// `ExpiredToken`, `UnknownSubject`) are distinct variants so logs and tests
/// can tell them apart, but they all render as the same generic 401 body.
/// Callers must not be able to probe which check failed.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed input, reported back to the caller
    #[error("Validation error: {0}")]
    Validation(String),

    /// No bearer token on a protected request
    #[error("Missing bearer token")]
    Unauthenticated,

    /// Token signature did not verify
    #[error("Invalid token")]
    InvalidToken,

    /// Token expiry has passed
    #[error("Expired token")]
    ExpiredToken,

    /// Token subject does not resolve to an existing account
    #[error("Unknown token subject")]
    UnknownSubject,

    /// Authenticated identity does not own the addressed resource
    #[error("Permission denied")]
    PermissionDenied,

    /// Duplicate username on registration
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Operation on a nonexistent account
    #[error("Not found: {0}")]
    NotFound(String),

    /// Too many login attempts
    #[error("Too many requests")]
    TooManyRequests,

    /// The persistence layer is unreachable; retryable, not fatal to the process
    #[error("Store unavailable")]
    StoreUnavailable,

    /// Internal server error
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Unauthenticated
            | ApiError::InvalidToken
            | ApiError::ExpiredToken
            | ApiError::UnknownSubject => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::PermissionDenied => (StatusCode::FORBIDDEN, "Permission denied".to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests".to_string(),
            ),
            ApiError::StoreUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service unavailable".to_string(),
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ApiError::Conflict("Already exists".to_string())
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => {
                tracing::error!("Store unreachable: {}", err);
                ApiError::StoreUnavailable
            }
            _ => {
                tracing::error!("Database error: {}", err);
                ApiError::Internal
            }
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_auth_failures_share_one_status() {
        assert_eq!(
            status_of(ApiError::Unauthenticated),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(ApiError::InvalidToken), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(ApiError::ExpiredToken), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(ApiError::UnknownSubject),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_permission_denied_is_distinct_from_auth_failure() {
        assert_eq!(
            status_of(ApiError::PermissionDenied),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_taxonomy_status_codes() {
        assert_eq!(
            status_of(ApiError::Validation("bad".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(ApiError::Conflict("dup".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ApiError::NotFound("gone".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ApiError::StoreUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(ApiError::TooManyRequests),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
