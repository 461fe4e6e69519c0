//! Error types for the HTTP API

use crate::matching::MatchError;
use crate::services::{CatalogError, MediaServerError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409), e.g. a bulk run already in progress
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage failure (500)
    #[error("Common error: {0}")]
    Common(#[from] awl_common::Error),

    /// Anime catalog failure (429 when rate limited, else 502)
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Media server failure
    #[error("Media server error: {0}")]
    MediaServer(#[from] MediaServerError),

    /// Title validation failure
    #[error("Match error: {0}")]
    Match(#[from] MatchError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
            ApiError::Catalog(ref err) if err.is_rate_limited() => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                err.to_string(),
            ),
            ApiError::Catalog(ref err) => {
                (StatusCode::BAD_GATEWAY, "CATALOG_ERROR", err.to_string())
            }
            ApiError::MediaServer(MediaServerError::SyncDisabled) => (
                StatusCode::BAD_REQUEST,
                "SYNC_DISABLED",
                MediaServerError::SyncDisabled.to_string(),
            ),
            ApiError::MediaServer(ref err) => (
                StatusCode::BAD_GATEWAY,
                "MEDIA_SERVER_ERROR",
                err.to_string(),
            ),
            ApiError::Match(ref err) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", err.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, %message, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
