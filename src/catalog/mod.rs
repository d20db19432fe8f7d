//! Catalog (Spotify Web API) integration - the metadata resolver.
//!
//! Resolves a catalog track id into canonical [`TrackMetadata`] and exposes
//! the catalog's free-text search for the `/q` route.
//!
//! Layout follows the usual client split:
//! - `dto` - exact API response shapes
//! - `adapter` - the only place DTOs become domain types
//! - `client` - HTTP + client-credentials token handling
//!
//! API docs: https://developer.spotify.com/documentation/web-api

pub mod dto;
mod adapter;
mod client;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::TrackMetadata;

pub use adapter::to_metadata;
pub use client::CatalogClient;

/// Metadata resolver capability.
///
/// Implemented by [`CatalogClient`] in production and by mocks in tests.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Resolve a track id. Fails with `NotFound` for unknown ids and
    /// `Upstream` for transport/auth trouble. Never retries.
    async fn resolve(&self, track_id: &str) -> Result<TrackMetadata>;

    /// Free-text catalog search; the raw response is passed through.
    async fn search(&self, query: &str) -> Result<serde_json::Value>;
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn resolve(&self, track_id: &str) -> Result<TrackMetadata> {
        self.lookup_track(track_id).await
    }

    async fn search(&self, query: &str) -> Result<serde_json::Value> {
        self.search_tracks(query).await
    }
}
