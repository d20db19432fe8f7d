//! Keyword search backend (no API key).
//!
//! Fetches the public results page and pulls the `ytInitialData` document
//! embedded in it. The document layout shifts often, so the walk looks for
//! any `videoRenderer` object instead of following a fixed path.

use async_trait::async_trait;
use serde_json::Value;

use super::{SourceCandidate, SourceSearch, parse_clock_duration};
use crate::error::{FetchError, Result};
use crate::net::status_error;

const INITIAL_DATA_MARKERS: [&str; 2] = ["var ytInitialData = ", "window[\"ytInitialData\"] = "];

/// Keyword search over the public results page
pub struct KeywordSearch {
    http_client: reqwest::Client,
    base_url: String,
}

impl KeywordSearch {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url: "https://www.youtube.com".to_string(),
        }
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/results?search_query={}",
            self.base_url,
            urlencoding::encode(query)
        )
    }
}

#[async_trait]
impl SourceSearch for KeywordSearch {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn search(&self, query: &str) -> Result<Vec<SourceCandidate>> {
        let response = self
            .http_client
            .get(self.search_url(query))
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| FetchError::upstream(format!("keyword search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("keyword search", status));
        }

        let page = response
            .text()
            .await
            .map_err(|e| FetchError::upstream(format!("keyword search body unreadable: {}", e)))?;

        parse_results_page(&page)
    }
}

/// Extract ordered candidates from a results page
fn parse_results_page(page: &str) -> Result<Vec<SourceCandidate>> {
    let data = extract_initial_data(page)
        .ok_or_else(|| FetchError::upstream("results page has no ytInitialData"))?;

    let mut candidates = Vec::new();
    collect_videos(&data, &mut candidates);
    Ok(candidates)
}

/// Locate and parse the embedded JSON document
fn extract_initial_data(page: &str) -> Option<Value> {
    let start = INITIAL_DATA_MARKERS
        .iter()
        .find_map(|marker| page.find(marker).map(|i| i + marker.len()))?;

    // The object is followed by `;</script>`; a streaming deserializer stops
    // at the end of the first complete value without needing that boundary.
    let mut stream = serde_json::Deserializer::from_str(&page[start..]).into_iter::<Value>();
    stream.next()?.ok()
}

/// Depth-first walk collecting `videoRenderer` entries in document order
fn collect_videos(node: &Value, out: &mut Vec<SourceCandidate>) {
    match node {
        Value::Object(map) => {
            if let Some(renderer) = map.get("videoRenderer") {
                if let Some(candidate) = renderer_to_candidate(renderer) {
                    out.push(candidate);
                }
                return;
            }
            for value in map.values() {
                collect_videos(value, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_videos(item, out);
            }
        }
        _ => {}
    }
}

fn renderer_to_candidate(renderer: &Value) -> Option<SourceCandidate> {
    let source_id = renderer.get("videoId")?.as_str()?.to_string();
    let duration_seconds = renderer
        .pointer("/lengthText/simpleText")
        .and_then(Value::as_str)
        .and_then(parse_clock_duration);

    Some(SourceCandidate {
        source_id,
        duration_seconds,
    })
}
