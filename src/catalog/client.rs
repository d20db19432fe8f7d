//! Catalog HTTP client
//!
//! Handles communication with the Spotify Web API using the
//! client-credentials flow. See:
//! https://developer.spotify.com/documentation/web-api/tutorials/client-credentials-flow
//!
//! The access token is cached and reused until shortly before it expires,
//! so a steady stream of requests costs one token call per hour.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use super::{adapter, dto};
use crate::error::{FetchError, Result};
use crate::model::TrackMetadata;
use crate::net::status_error;

/// Refresh tokens this long before the server-side expiry
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Results per catalog search
const SEARCH_LIMIT: u32 = 50;

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Catalog API client
pub struct CatalogClient {
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
    api_url: String,
    token_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl CatalogClient {
    /// Create a new client using the shared HTTP client
    pub fn new(
        http_client: reqwest::Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_url: "https://api.spotify.com/v1".to_string(),
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            token: Mutex::new(None),
        }
    }

    /// Create a client for testing with custom base URLs
    #[cfg(test)]
    pub fn with_base_urls(api_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token_url: token_url.into(),
            ..Self::new(reqwest::Client::new(), "test-id", "test-secret")
        }
    }

    /// Look up a track by catalog id and convert it to domain metadata
    pub async fn lookup_track(&self, track_id: &str) -> Result<TrackMetadata> {
        let url = format!(
            "{}/tracks/{}",
            self.api_url,
            urlencoding::encode(track_id)
        );
        let response = self.authorized_get(&url).await?;
        let status = response.status();

        // 400 is what the API answers for ids that aren't valid base62
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::BAD_REQUEST {
            return Err(FetchError::NotFound(track_id.to_string()));
        }
        if !status.is_success() {
            return Err(self.error_from(response).await);
        }

        let track = response
            .json::<dto::Track>()
            .await
            .map_err(|e| FetchError::upstream(format!("invalid catalog response: {}", e)))?;

        tracing::debug!(track_id, title = %track.name, "Resolved catalog track");
        adapter::to_metadata(track)
    }

    /// Free-text track search, returned as the raw API document
    pub async fn search_tracks(&self, query: &str) -> Result<serde_json::Value> {
        let url = format!(
            "{}/search?q={}&type=track&limit={}",
            self.api_url,
            urlencoding::encode(query),
            SEARCH_LIMIT
        );
        let response = self.authorized_get(&url).await?;

        if !response.status().is_success() {
            return Err(self.error_from(response).await);
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| FetchError::upstream(format!("invalid catalog response: {}", e)))
    }

    /// Send a GET with a valid bearer token, refreshing it once on 401
    async fn authorized_get(&self, url: &str) -> Result<reqwest::Response> {
        let token = self.access_token().await?;
        let response = self.send_get(url, &token).await?;

        if response.status() != reqwest::StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        // Token revoked or expired early; drop it and try once more
        tracing::debug!("Catalog rejected cached token, refreshing");
        *self.token.lock().await = None;
        let token = self.access_token().await?;
        self.send_get(url, &token).await
    }

    async fn send_get(&self, url: &str, token: &str) -> Result<reqwest::Response> {
        self.http_client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| FetchError::upstream(format!("catalog request failed: {}", e)))
    }

    /// Return a cached token, requesting a new one when missing or stale
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref()
            && token.expires_at > Instant::now()
        {
            return Ok(token.access_token.clone());
        }

        let fresh = self.request_token().await?;
        let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        let access_token = fresh.access_token;
        *cached = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(access_token)
    }

    async fn request_token(&self) -> Result<dto::TokenResponse> {
        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| FetchError::upstream(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::upstream(format!(
                "catalog authentication failed: HTTP {}",
                status.as_u16()
            )));
        }

        response
            .json::<dto::TokenResponse>()
            .await
            .map_err(|e| FetchError::upstream(format!("invalid token response: {}", e)))
    }

    /// Build an error from a failed response, using the API's message if any
    async fn error_from(&self, response: reqwest::Response) -> FetchError {
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return FetchError::RateLimited("catalog".to_string());
        }
        match response.json::<dto::ErrorResponse>().await {
            Ok(body) => FetchError::upstream(format!(
                "catalog returned HTTP {}: {}",
                body.error.status, body.error.message
            )),
            Err(_) => status_error("catalog", status),
        }
    }
}
