// Error handling module
// Contains custom error types and error handling utilities

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

// Application error type
#[derive(Debug, Error, Serialize)]
pub enum AppError {
    /// Malformed client input. Maps to HTTP 400, no retry.
    #[error("{0}")]
    InvalidRequest(String),

    /// Product image rejected by the vision check. Carries a machine-readable
    /// code in the HTTP body so the client can offer to skip validation.
    #[error("{0}")]
    ProductValidationFailed(String),

    /// Upstream API failure. The message is the upstream error text, verbatim.
    #[error("{0}")]
    ApiError(String),

    /// ffmpeg/ffprobe failure or unusable media input.
    #[error("{0}")]
    MediaError(String),

    /// A poll loop exhausted its wall-clock budget.
    #[error("{0} timed out")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("I/O error: {0}")]
    #[serde(serialize_with = "serialize_io_error")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error(transparent)]
    #[serde(skip)]
    AnyhowError(#[from] anyhow::Error),
}

fn serialize_io_error<S>(err: &std::io::Error, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&err.to_string())
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ApiError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidRequest(_) | AppError::ProductValidationFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::ProductValidationFailed(_) => {
                json!({ "message": self.to_string(), "code": "VALIDATION_FAILED" })
            }
            _ => json!({ "message": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

// Result type alias for application
pub type AppResult<T> = Result<T, AppError>;
