//! YouTube Data API v3 search backend.
//!
//! Uses `search.list` restricted to videos. Each call costs 100 quota units,
//! so quota exhaustion surfaces as a rate limit.
//!
//! API: https://developers.google.com/youtube/v3/docs/search/list

use async_trait::async_trait;

use super::{SourceCandidate, SourceSearch, dto};
use crate::error::{FetchError, Result};
use crate::net::status_error;

/// Only the first candidate is ever used
const MAX_RESULTS: u32 = 1;

/// Data API search client
pub struct DataApiSearch {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl DataApiSearch {
    pub fn new(http_client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
        }
    }

    /// Create a client for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::new(reqwest::Client::new(), api_key)
        }
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search?part=id&type=video&maxResults={}&q={}&key={}",
            self.base_url,
            MAX_RESULTS,
            urlencoding::encode(query),
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl SourceSearch for DataApiSearch {
    fn name(&self) -> &'static str {
        "data-api"
    }

    async fn search(&self, query: &str) -> Result<Vec<SourceCandidate>> {
        let response = self
            .http_client
            .get(self.search_url(query))
            .send()
            .await
            .map_err(|e| FetchError::upstream(format!("data-api request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(match response.json::<dto::DataApiErrorResponse>().await {
                Ok(body) => api_error(body.error),
                Err(_) => status_error("data-api", status),
            });
        }

        let body = response
            .json::<dto::DataApiSearchResponse>()
            .await
            .map_err(|e| FetchError::upstream(format!("invalid data-api response: {}", e)))?;

        Ok(to_candidates(body))
    }
}

/// Quota and rate errors are rate limits; everything else is upstream trouble
fn api_error(error: dto::DataApiError) -> FetchError {
    let rate_limited = error.errors.iter().any(|d| {
        matches!(
            d.reason.as_deref(),
            Some("quotaExceeded" | "rateLimitExceeded" | "userRateLimitExceeded")
        )
    });
    if rate_limited {
        FetchError::RateLimited("data-api".to_string())
    } else {
        FetchError::upstream(format!("data-api error {}: {}", error.code, error.message))
    }
}

fn to_candidates(body: dto::DataApiSearchResponse) -> Vec<SourceCandidate> {
    body.items
        .into_iter()
        .filter_map(|item| item.id.video_id)
        .map(SourceCandidate::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_query_and_key() {
        let search = DataApiSearch::with_base_url("k&y", "http://localhost/yt");
        let url = search.search_url("AC/DC Back In Black");
        assert!(url.starts_with("http://localhost/yt/search?part=id&type=video&maxResults=1"));
        assert!(url.contains("q=AC%2FDC%20Back%20In%20Black"));
        assert!(url.contains("key=k%26y"));
    }

    #[test]
    fn test_to_candidates_skips_non_videos() {
        let body: dto::DataApiSearchResponse = serde_json::from_str(
            r#"{"items": [
                {"id": {"kind": "youtube#channel", "channelId": "UC1"}},
                {"id": {"kind": "youtube#video", "videoId": "yt1"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(to_candidates(body), vec![SourceCandidate::new("yt1")]);
    }

    #[test]
    fn test_quota_error_is_rate_limit() {
        let error = dto::DataApiError {
            code: 403,
            message: "quota".into(),
            errors: vec![dto::DataApiErrorDetail {
                reason: Some("quotaExceeded".into()),
            }],
        };
        assert!(matches!(api_error(error), FetchError::RateLimited(_)));
    }

    #[test]
    fn test_bad_key_is_upstream() {
        let error = dto::DataApiError {
            code: 400,
            message: "API key not valid".into(),
            errors: vec![dto::DataApiErrorDetail {
                reason: Some("keyInvalid".into()),
            }],
        };
        assert!(matches!(api_error(error), FetchError::Upstream(ref m) if m.contains("API key")));
    }
}
