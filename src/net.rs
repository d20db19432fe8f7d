//! Shared outbound HTTP client.
//!
//! One `reqwest::Client` is built at startup and cloned into every remote
//! component (catalog, search backends, artwork). Cloning shares the
//! connection pool.

use std::time::Duration;

use crate::config::{ConfigError, NetworkConfig};

/// User agent string sent with every request
pub const USER_AGENT: &str = concat!(
    "TrackFetch/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/track-fetch)"
);

/// Connection establishment limit. Whole-request deadlines belong to the
/// orchestrator, not to individual calls.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Build the shared client, routing through the configured proxy if any.
pub fn build_client(network: &NetworkConfig) -> Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder()
        .gzip(true)
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT);

    if let Some(proxy_url) = network.proxy.as_deref().filter(|p| !p.is_empty()) {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ConfigError::HttpClient(format!("invalid proxy {}: {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
        tracing::info!("Routing outbound requests through proxy {}", proxy_url);
    }

    builder
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Map a non-success status to the shared error taxonomy.
///
/// `404` is left to callers since its meaning differs per service.
pub(crate) fn status_error(service: &str, status: reqwest::StatusCode) -> crate::error::FetchError {
    use crate::error::FetchError;

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return FetchError::RateLimited(service.to_string());
    }
    FetchError::Upstream(format!(
        "{} returned HTTP {}: {}",
        service,
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    ))
}
