//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use keygate_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Optional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// `AppError` carried across the Axum boundary.
///
/// `IntoResponse` cannot be implemented for `AppError` in this crate
/// (foreign trait on a foreign type), so handlers return this wrapper
/// and let `?` convert through `From`.
#[derive(Debug)]
pub struct ApiError {
    /// The underlying domain error.
    pub inner: AppError,
    /// Structured details surfaced to the client, currently only field
    /// errors from request validation.
    pub details: Option<serde_json::Value>,
}

impl From<AppError> for ApiError {
    fn from(inner: AppError) -> Self {
        Self {
            inner,
            details: None,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self {
            inner: AppError::validation("Request validation failed"),
            details: serde_json::to_value(&errors).ok(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.inner;
        // Credential and token failures collapse into one outward shape;
        // unknown-email, wrong-password, and stale-token must be
        // indistinguishable to the caller.
        let (status, error_code, message) = match err.kind {
            ErrorKind::Validation => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                err.message.clone(),
            ),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT", err.message.clone()),
            ErrorKind::InvalidCredentials | ErrorKind::StaleCredential => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Authentication failed. Please sign in again.".to_string(),
            ),
            ErrorKind::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", err.message.clone()),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", err.message.clone()),
            ErrorKind::OtpExpired => (StatusCode::GONE, "OTP_EXPIRED", err.message.clone()),
            ErrorKind::OtpNoChallenge => (
                StatusCode::BAD_REQUEST,
                "OTP_NO_CHALLENGE",
                err.message.clone(),
            ),
            ErrorKind::OtpMismatch => (
                StatusCode::UNAUTHORIZED,
                "OTP_MISMATCH",
                err.message.clone(),
            ),
            ErrorKind::Transient => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Service temporarily unavailable".to_string(),
            ),
            ErrorKind::Serialization | ErrorKind::Configuration | ErrorKind::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(kind = %err.kind, message = %err.message, "Request failed");
        } else {
            tracing::debug!(
                kind = %err.kind,
                message = %err.message,
                status = %status,
                "Request rejected"
            );
        }

        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message,
            details: self.details,
        };

        (status, Json(body)).into_response()
    }
}
