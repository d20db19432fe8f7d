//! Route handlers.

use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::io::ReaderStream;

use super::AppState;
use super::error::ApiError;
use crate::model::FinalFile;

/// GET /
pub async fn index() -> Json<serde_json::Value> {
    Json(json!({"message": "ok"}))
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
    })
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

/// GET /q?query=<text>
///
/// Passes the catalog's track search through unchanged.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let query = params
        .query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("query parameter is required".to_string()))?;

    let data = state.catalog.search(&query).await?;
    Ok(Json(json!({"data": data})))
}

/// GET /download/:track_id
///
/// Runs the pipeline on its own task so a client disconnect does not
/// abandon a half-finished file, then streams the result.
pub async fn download(
    State(state): State<AppState>,
    Path(track_id): Path<String>,
) -> Result<Response, ApiError> {
    let pipeline = state.pipeline.clone();
    let file = tokio::spawn(async move { pipeline.run(&track_id).await })
        .await
        .map_err(|e| ApiError::Internal(format!("pipeline task failed: {}", e)))??;

    stream_file(&file).await
}

async fn stream_file(file: &FinalFile) -> Result<Response, ApiError> {
    let handle = tokio::fs::File::open(&file.path)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to open {}: {}", file.path.display(), e)))?;
    let length = handle.metadata().await.ok().map(|m| m.len());

    let disposition = HeaderValue::from_str(&content_disposition(&file.file_name()))
        .map_err(|e| ApiError::Internal(format!("invalid filename header: {}", e)))?;

    let mut response = Body::from_stream(ReaderStream::new(handle)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(file.mime_type));
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    if let Some(length) = length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    Ok(response)
}

/// `attachment` disposition with an ASCII fallback and the RFC 5987 UTF-8 name
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}
