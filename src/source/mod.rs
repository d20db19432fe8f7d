//! Source locator - finds a matching item on the source platform.
//!
//! # Architecture
//!
//! - [`SourceSearch`] is the one capability every backend shares:
//!   free-text query in, ordered candidate ids out.
//! - [`SearchBackend`] is the tagged set of concrete backends; exactly one is
//!   built from configuration at startup.
//! - [`SourceLocator`] builds the query and takes the first candidate.
//!
//! There is no ranking or scoring: match correctness is probabilistic and is
//! not verified before acquisition.

pub mod dto;
mod data_api;
mod invidious;
mod keyword;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, ConfigError, SearchBackendKind};
use crate::error::{FetchError, Result};
use crate::model::SourceMatch;

pub use data_api::DataApiSearch;
pub use invidious::InvidiousSearch;
pub use keyword::KeywordSearch;

/// A search hit on the source platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCandidate {
    pub source_id: String,
    pub duration_seconds: Option<u32>,
}

impl SourceCandidate {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            duration_seconds: None,
        }
    }
}

/// Search capability shared by all backends.
#[async_trait]
pub trait SourceSearch: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Candidates in the order the backend ranks them
    async fn search(&self, query: &str) -> Result<Vec<SourceCandidate>>;
}

/// The configured backend for this deployment.
pub enum SearchBackend {
    Keyword(KeywordSearch),
    DataApi(DataApiSearch),
    Invidious(InvidiousSearch),
}

impl SearchBackend {
    /// Build the backend selected in the configuration.
    pub fn from_config(config: &Config, http_client: reqwest::Client) -> std::result::Result<Self, ConfigError> {
        let backend = match config.search.backend {
            SearchBackendKind::Keyword => Self::Keyword(KeywordSearch::new(http_client)),
            SearchBackendKind::DataApi => {
                let key = config
                    .credentials
                    .youtube_api_key
                    .clone()
                    .ok_or(ConfigError::Missing("YT_API_KEY"))?;
                Self::DataApi(DataApiSearch::new(http_client, key))
            }
            SearchBackendKind::Invidious => {
                let url = config
                    .search
                    .invidious_url
                    .clone()
                    .ok_or(ConfigError::Missing("INVIDIOUS_URL"))?;
                Self::Invidious(InvidiousSearch::new(http_client, url))
            }
        };
        Ok(backend)
    }
}

#[async_trait]
impl SourceSearch for SearchBackend {
    fn name(&self) -> &'static str {
        match self {
            SearchBackend::Keyword(b) => b.name(),
            SearchBackend::DataApi(b) => b.name(),
            SearchBackend::Invidious(b) => b.name(),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<SourceCandidate>> {
        match self {
            SearchBackend::Keyword(b) => b.search(query).await,
            SearchBackend::DataApi(b) => b.search(query).await,
            SearchBackend::Invidious(b) => b.search(query).await,
        }
    }
}

/// Resolves (artist, title) to a source id through one backend.
#[derive(Clone)]
pub struct SourceLocator {
    backend: Arc<dyn SourceSearch>,
}

impl SourceLocator {
    pub fn new(backend: Arc<dyn SourceSearch>) -> Self {
        Self { backend }
    }

    /// Name of the backend in use
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Find the first candidate for `"{artist} {title}"`.
    ///
    /// `hint_duration` is carried for logging only; it does not influence
    /// which candidate is chosen.
    pub async fn locate(
        &self,
        artist: &str,
        title: &str,
        hint_duration: Option<u32>,
    ) -> Result<SourceMatch> {
        let query = build_query(artist, title);
        let candidates = self.backend.search(&query).await?;

        let Some(first) = candidates.into_iter().next() else {
            return Err(FetchError::NoMatch(query));
        };

        tracing::debug!(
            backend = self.backend.name(),
            query = %query,
            source_id = %first.source_id,
            candidate_duration = ?first.duration_seconds,
            hint_duration = ?hint_duration,
            "Located source"
        );

        Ok(SourceMatch {
            source_id: first.source_id,
            duration_seconds: first.duration_seconds,
        })
    }
}

/// Search query for a track
pub fn build_query(artist: &str, title: &str) -> String {
    format!("{} {}", artist, title)
}

/// Parse a `"H:MM:SS"` / `"M:SS"` duration label into seconds
pub(crate) fn parse_clock_duration(text: &str) -> Option<u32> {
    text.trim()
        .split(':')
        .try_fold(0u32, |acc, part| {
            let value: u32 = part.trim().parse().ok()?;
            acc.checked_mul(60)?.checked_add(value)
        })
        .filter(|&secs| secs > 0)
}
