use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use taskd_core::error::CoreError;

/// Client-facing request errors. Every variant renders as
/// `{"error": "<message>"}` with the matching status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// Carries the internal detail for the log; clients get a generic body.
    #[error("{0}")]
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(_) => ApiError::NotFound("task not found".to_string()),
            CoreError::Rule(rule_err) => ApiError::BadRequest(rule_err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => {
                tracing::warn!(%message, "bad request");
                (StatusCode::BAD_REQUEST, message)
            }
            ApiError::Unauthorized(message) => {
                tracing::warn!(%message, "unauthorized request");
                (StatusCode::UNAUTHORIZED, message)
            }
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
