//! Source platform Data Transfer Objects
//!
//! Response shapes for the YouTube Data API v3 `search` endpoint and the
//! Invidious `/api/v1/search` endpoint. The keyword backend scrapes an HTML
//! page and walks its embedded JSON untyped, so it has no DTOs here.
//!
//! DO NOT use these types outside the source module.

use serde::{Deserialize, Serialize};

/// `GET https://www.googleapis.com/youtube/v3/search`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataApiSearchResponse {
    #[serde(default)]
    pub items: Vec<DataApiItem>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataApiItem {
    pub id: DataApiItemId,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataApiItemId {
    pub kind: Option<String>,
    /// Present only for `youtube#video` results
    pub video_id: Option<String>,
}

/// Data API error envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataApiErrorResponse {
    pub error: DataApiError,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataApiError {
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub errors: Vec<DataApiErrorDetail>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataApiErrorDetail {
    pub reason: Option<String>,
}

/// One entry of `GET {instance}/api/v1/search`
///
/// Results mix videos, channels and playlists; only videos carry a
/// `videoId`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvidiousItem {
    #[serde(rename = "type")]
    pub item_type: String,
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub length_seconds: Option<u32>,
}

/// Invidious error body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InvidiousError {
    pub error: String,
}

// ============================================================================
// CONTRACT TESTS
// ============================================================================
