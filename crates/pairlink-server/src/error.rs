//! HTTP error responses.
//!
//! Every failure body is `{"success": false, "error": "<message>"}`. Server
//! faults are logged here and reported with a fixed message so store
//! endpoints and other internals never reach the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pairlink_core::PairlinkError;
use serde_json::json;
use std::borrow::Cow;
use tracing::error;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: Cow<'static, str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn body_required() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Request body is required")
    }

    pub fn route_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Route not found")
    }

    /// Map a core error. Server faults are logged and reported as `fallback`.
    pub fn from_core(err: PairlinkError, fallback: &'static str) -> Self {
        let status = status_for(&err);
        if err.is_client_error() {
            Self::new(status, err.public_message())
        } else {
            error!("{}: {}", fallback, err);
            Self::new(status, fallback)
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<PairlinkError> for ApiError {
    fn from(err: PairlinkError) -> Self {
        Self::from_core(err, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({"success": false, "error": self.message})),
        )
            .into_response()
    }
}

/// HTTP status for a core error.
pub fn status_for(err: &PairlinkError) -> StatusCode {
    match err {
        PairlinkError::InvalidFormat { .. }
        | PairlinkError::EmptyLink
        | PairlinkError::InvalidUrl
        | PairlinkError::NotPaired => StatusCode::BAD_REQUEST,
        PairlinkError::NotFound { .. } => StatusCode::NOT_FOUND,
        PairlinkError::Unauthorized => StatusCode::UNAUTHORIZED,
        PairlinkError::ExhaustedRetries { .. }
        | PairlinkError::Storage { .. }
        | PairlinkError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&PairlinkError::InvalidFormat { field: "code" }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&PairlinkError::InvalidUrl), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&PairlinkError::EmptyLink), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&PairlinkError::NotFound {
                code: "ABC123".into()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&PairlinkError::Unauthorized),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&PairlinkError::ExhaustedRetries { attempts: 10 }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_detail_is_hidden() {
        let err = ApiError::from_core(
            PairlinkError::storage("POST https://secret.upstash.io failed"),
            "Failed to submit link",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Failed to submit link");
    }

    #[test]
    fn test_client_error_uses_public_message() {
        let err = ApiError::from_core(PairlinkError::InvalidUrl, "Failed to submit link");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Invalid URL format");
    }
}
