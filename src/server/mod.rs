//! HTTP surface (axum).
//!
//! Routes:
//! - `GET /` - liveness, `{"message": "ok"}`
//! - `GET /health` - status, version, uptime
//! - `GET /q?query=..` - catalog search passthrough
//! - `GET /download/:track_id` - run the pipeline and stream the file
//!
//! CORS is permissive; requests are logged through `TraceLayer`.

mod error;
mod routes;

use std::sync::Arc;

use anyhow::Context;
use axum::{Router, routing::get};
use chrono::{DateTime, Utc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::catalog::CatalogApi;
use crate::config::Config;
use crate::net;
use crate::pipeline::Pipeline;

pub use error::{ApiError, status_for};
pub use routes::{HealthResponse, content_disposition};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub catalog: Arc<dyn CatalogApi>,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            catalog: pipeline.catalog(),
            pipeline,
            startup_time: Utc::now(),
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/q", get(routes::search))
        .route("/download/:track_id", get(routes::download))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let http_client = net::build_client(&config.network)?;
    let pipeline = Arc::new(Pipeline::from_config(config, http_client)?);
    let app = build_router(AppState::new(pipeline));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
