//! Unified API error type
//!
//! Every handler and service returns `Result<_, ApiError>`. The variant
//! determines the HTTP status; the message is surfaced to the caller as
//! `{"error": "..."}` JSON. Internal errors are logged and replaced with
//! a generic message so no plumbing details leak.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input (400).
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid session (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not permitted for this action (403).
    #[error("{0}")]
    Forbidden(String),

    /// Record does not exist (404).
    #[error("{0}")]
    NotFound(String),

    /// Status transition not legal from the current state (400).
    #[error("{0}")]
    InvalidState(String),

    /// Share token past its expiry (410).
    #[error("{0}")]
    Expired(String),

    /// Share token explicitly revoked by the creator (410).
    #[error("{0}")]
    Revoked(String),

    /// Unexpected failure (500).
    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidState(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Expired(_) | ApiError::Revoked(_) => StatusCode::GONE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Internal(detail) => {
                error!(detail = %detail, "Internal server error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => ApiError::NotFound("Record not found".to_string()),
            other => ApiError::Internal(format!("Database error: {other}")),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(format!("{err:#}"))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(format!("Validation failed: {err}"))
    }
}
