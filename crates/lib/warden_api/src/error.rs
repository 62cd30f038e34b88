//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;
use warden_core::auth::AuthError;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
///
/// Messages are generic; detail for `Unavailable` and `Internal` is only
/// logged.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Service unavailable")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.as_str()),
            AppError::TooManyRequests(m) => {
                (StatusCode::TOO_MANY_REQUESTS, "too_many_requests", m.as_str())
            }
            AppError::Unavailable(detail) => {
                error!(%detail, "identity store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    "Service temporarily unavailable",
                )
            }
            AppError::Internal(detail) => {
                error!(%detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::CredentialMismatch
            | AuthError::MissingOrMalformedHeader
            | AuthError::TokenInvalidOrExpired
            | AuthError::IdentityNotFound => AppError::Unauthorized(e.to_string()),
            AuthError::DuplicateIdentity => AppError::Conflict(e.to_string()),
            AuthError::Validation(msg) => AppError::BadRequest(msg),
            AuthError::StoreUnavailable(msg) => AppError::Unavailable(msg),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_status_categories() {
        let cases = [
            (AuthError::CredentialMismatch, StatusCode::UNAUTHORIZED),
            (AuthError::MissingOrMalformedHeader, StatusCode::UNAUTHORIZED),
            (AuthError::TokenInvalidOrExpired, StatusCode::UNAUTHORIZED),
            (AuthError::IdentityNotFound, StatusCode::UNAUTHORIZED),
            (AuthError::DuplicateIdentity, StatusCode::CONFLICT),
            (AuthError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                AuthError::StoreUnavailable("pool timed out".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AuthError::Internal("bcrypt".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(status, AppError::from(err).into_response().status());
        }
    }

    #[test]
    fn too_many_requests_is_429() {
        let resp = AppError::TooManyRequests("slow down".into()).into_response();
        assert_eq!(StatusCode::TOO_MANY_REQUESTS, resp.status());
    }

    #[test]
    fn credential_failures_share_one_message() {
        let AppError::Unauthorized(msg) = AppError::from(AuthError::CredentialMismatch) else {
            panic!("expected Unauthorized");
        };
        assert_eq!("Invalid credentials", msg);
    }
}
