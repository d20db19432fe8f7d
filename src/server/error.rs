//! HTTP error mapping.
//!
//! Every failure leaves the server as JSON:
//!
//! ```json
//! {"error": "Track not found: abc", "code": "NOT_FOUND", "stage": "resolving"}
//! ```
//!
//! `stage` is present only for pipeline failures.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::error::{Failure, FetchError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// A pipeline run ended in a stage failure
    #[error(transparent)]
    Pipeline(#[from] Failure),

    /// A direct component call (catalog search) failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// HTTP status for a fetch error
pub fn status_for(error: &FetchError) -> StatusCode {
    match error {
        FetchError::NotFound(_)
        | FetchError::MissingArtist(_)
        | FetchError::NoMatch(_)
        | FetchError::Unavailable(_) => StatusCode::NOT_FOUND,
        FetchError::Upstream(_) | FetchError::RateLimited(_) => StatusCode::BAD_GATEWAY,
        FetchError::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
        FetchError::Transcode(_) | FetchError::CorruptMedia { .. } | FetchError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, stage) = match &self {
            ApiError::Pipeline(failure) => (
                status_for(&failure.cause),
                failure.cause.code(),
                failure.cause.to_string(),
                Some(failure.stage.as_str()),
            ),
            ApiError::Fetch(err) => (status_for(err), err.code(), err.to_string(), None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
                None,
            ),
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(stage) = stage {
            body["stage"] = json!(stage);
        }

        (status, Json(body)).into_response()
    }
}
