// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Every token rejection collapses into the same `401 invalid_token` body so
//! clients cannot tell which check failed. The precise reason stays in the
//! logs.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::StoreError;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Token is structurally invalid")]
    Malformed,

    #[error("Token signature does not verify")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Refresh token was revoked or reused")]
    RevokedOrReused,

    #[error("Token store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Generic error code returned for every token rejection.
    pub const INVALID_TOKEN: &'static str = "invalid_token";

    /// Error code returned for server-side failures.
    pub const INTERNAL: &'static str = "internal";

    /// Whether this error is a token rejection (maps to 401).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AppError::Malformed
                | AppError::InvalidSignature
                | AppError::Expired
                | AppError::RevokedOrReused
        )
    }

    /// Whether a caller may retry the same request.
    ///
    /// Only store outages qualify; retrying a rejected token would just
    /// help brute forcing.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::StoreUnavailable(_))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => AppError::RevokedOrReused,
            StoreError::Unavailable(reason) => AppError::StoreUnavailable(reason),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            AppError::Malformed
            | AppError::InvalidSignature
            | AppError::Expired
            | AppError::RevokedOrReused => (StatusCode::UNAUTHORIZED, AppError::INVALID_TOKEN),
            AppError::StoreUnavailable(reason) => {
                tracing::error!(error = %reason, "Token store unavailable");
                (StatusCode::INTERNAL_SERVER_ERROR, AppError::INTERNAL)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, AppError::INTERNAL)
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_share_one_status() {
        for err in [
            AppError::Malformed,
            AppError::InvalidSignature,
            AppError::Expired,
            AppError::RevokedOrReused,
        ] {
            assert!(err.is_rejection());
            assert!(!err.is_retryable());
            assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_store_unavailable_is_retryable_500() {
        let err = AppError::StoreUnavailable("timed out".to_string());
        assert!(err.is_retryable());
        assert!(!err.is_rejection());
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_conflict_becomes_reuse() {
        assert!(matches!(
            AppError::from(StoreError::Conflict),
            AppError::RevokedOrReused
        ));
    }
}
