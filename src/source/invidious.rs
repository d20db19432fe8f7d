//! Invidious search backend (federated search proxy).
//!
//! Any public or self-hosted instance works; the instance URL comes from
//! configuration. Video ids are the source platform's ids, so acquisition
//! is unaffected by which instance answered the search.
//!
//! API: https://docs.invidious.io/api/#get-apiv1search

use async_trait::async_trait;

use super::{SourceCandidate, SourceSearch, dto};
use crate::error::{FetchError, Result};
use crate::net::status_error;

/// Invidious search client
pub struct InvidiousSearch {
    http_client: reqwest::Client,
    instance_url: String,
}

impl InvidiousSearch {
    pub fn new(http_client: reqwest::Client, instance_url: impl Into<String>) -> Self {
        Self {
            http_client,
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/api/v1/search?q={}&type=video",
            self.instance_url,
            urlencoding::encode(query)
        )
    }
}

#[async_trait]
impl SourceSearch for InvidiousSearch {
    fn name(&self) -> &'static str {
        "invidious"
    }

    async fn search(&self, query: &str) -> Result<Vec<SourceCandidate>> {
        let response = self
            .http_client
            .get(self.search_url(query))
            .send()
            .await
            .map_err(|e| FetchError::upstream(format!("invidious request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(match response.json::<dto::InvidiousError>().await {
                Ok(body) if status != reqwest::StatusCode::TOO_MANY_REQUESTS => {
                    FetchError::upstream(format!("invidious error: {}", body.error))
                }
                _ => status_error("invidious", status),
            });
        }

        let items = response
            .json::<Vec<dto::InvidiousItem>>()
            .await
            .map_err(|e| FetchError::upstream(format!("invalid invidious response: {}", e)))?;

        Ok(to_candidates(items))
    }
}

fn to_candidates(items: Vec<dto::InvidiousItem>) -> Vec<SourceCandidate> {
    items
        .into_iter()
        .filter(|item| item.item_type == "video")
        .filter_map(|item| {
            let source_id = item.video_id?;
            Some(SourceCandidate {
                source_id,
                duration_seconds: item.length_seconds.filter(|&s| s > 0),
            })
        })
        .collect()
}
