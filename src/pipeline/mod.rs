//! Pipeline orchestrator - turns a catalog track id into a finished file.
//!
//! # Stages
//!
//! ```text
//! Resolving -> Locating -> Acquiring -> Tagging -> Finalizing -> Done
//!     \___________\___________\___________\___________\______> Failed{stage, cause}
//! ```
//!
//! Every stage runs exactly once per request, in order, and the first error
//! ends the run. The reported [`Failure`] carries the stage that failed and
//! the error unchanged.
//!
//! # Policies
//!
//! - [`RetryPolicy`] wraps the network-bound stages (resolve, locate,
//!   acquire, tag) and retries transient errors only
//! - An overall deadline; expiry reports `TimedOut` at the current stage
//! - [`SourceLocks`] serializes acquire/tag/finalize per source id; the
//!   guard is held until the run's outcome is settled, cleanup included
//! - Failed artifacts are kept unless `cleanup_on_failure` is set

mod locks;
mod retry;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::acquire::{MediaFetcher, YtDlp, acquisition_path};
use crate::catalog::{CatalogApi, CatalogClient};
use crate::config::{Config, ConfigError, PipelineConfig};
use crate::error::{Failure, FetchError, Stage, StageExt};
use crate::model::FinalFile;
use crate::organizer;
use crate::source::{SearchBackend, SourceLocator, SourceSearch};
use crate::tagger::{ArtworkClient, TagWriter};

pub use locks::{SourceGuard, SourceLocks};
pub use retry::RetryPolicy;

/// Per-run progress shared with the deadline handler
struct RunState<'a> {
    track_id: &'a str,
    started: Instant,
    stage: Stage,
    /// Acquisition path once acquisition has started, until finalized
    artifact: Option<PathBuf>,
    /// Held from locating until the run's outcome, cleanup included
    guard: Option<SourceGuard<'a>>,
}

impl<'a> RunState<'a> {
    fn new(track_id: &'a str) -> Self {
        Self {
            track_id,
            started: Instant::now(),
            stage: Stage::Resolving,
            artifact: None,
            guard: None,
        }
    }

    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        tracing::info!(
            track_id = self.track_id,
            stage = %stage,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Entering stage"
        );
    }
}

/// The orchestrator. Built once at startup and shared by every request.
pub struct Pipeline {
    catalog: Arc<dyn CatalogApi>,
    locator: SourceLocator,
    fetcher: Arc<dyn MediaFetcher>,
    tagger: TagWriter,
    out_dir: PathBuf,
    retry: RetryPolicy,
    timeout: Option<Duration>,
    locks: Option<SourceLocks>,
    cleanup_on_failure: bool,
}

impl Pipeline {
    /// Assemble a pipeline from its components with default policies.
    pub fn new(
        catalog: Arc<dyn CatalogApi>,
        locator: SourceLocator,
        fetcher: Arc<dyn MediaFetcher>,
        tagger: TagWriter,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            locator,
            fetcher,
            tagger,
            out_dir: out_dir.into(),
            retry: RetryPolicy::default(),
            timeout: None,
            locks: Some(SourceLocks::new()),
            cleanup_on_failure: false,
        }
    }

    /// Apply orchestrator settings.
    pub fn with_settings(mut self, settings: &PipelineConfig) -> Self {
        self.retry = RetryPolicy::from_config(settings);
        self.timeout = (settings.request_timeout_secs > 0)
            .then(|| Duration::from_secs(settings.request_timeout_secs));
        self.locks = settings.lock_sources.then(SourceLocks::new);
        self.cleanup_on_failure = settings.cleanup_on_failure;
        self
    }

    /// Build the production pipeline from configuration.
    ///
    /// Creates the output directory if needed.
    pub fn from_config(config: &Config, http_client: reqwest::Client) -> Result<Self, ConfigError> {
        let out_dir = config.output.dir.clone();
        std::fs::create_dir_all(&out_dir).map_err(|e| ConfigError::CreateDir(out_dir.clone(), e))?;

        let (client_id, client_secret) = match (
            config.credentials.client_id.clone(),
            config.credentials.client_secret.clone(),
        ) {
            (Some(id), Some(secret)) => (id, secret),
            (None, _) => return Err(ConfigError::Missing("CLIENT_ID")),
            (_, None) => return Err(ConfigError::Missing("CLIENT_SECRET")),
        };

        let catalog = Arc::new(CatalogClient::new(http_client.clone(), client_id, client_secret));
        let backend = SearchBackend::from_config(config, http_client.clone())?;
        let fetcher = YtDlp::from_config(&config.output, &config.network);
        let tagger = TagWriter::new(Arc::new(ArtworkClient::new(http_client)));

        tracing::info!(
            backend = backend.name(),
            ytdlp = fetcher.program(),
            out_dir = %out_dir.display(),
            container = config.output.container.extension(),
            "Pipeline configured"
        );

        Ok(Self::new(
            catalog,
            SourceLocator::new(Arc::new(backend)),
            Arc::new(fetcher),
            tagger,
            out_dir,
        )
        .with_settings(&config.pipeline))
    }

    /// Catalog used for resolution, shared with the search route
    pub fn catalog(&self) -> Arc<dyn CatalogApi> {
        self.catalog.clone()
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Run every stage for `track_id`.
    pub async fn run<'a>(&'a self, track_id: &'a str) -> Result<FinalFile, Failure> {
        let mut state = RunState::new(track_id);

        let result = {
            let work = self.execute(&mut state);
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| limit),
                None => Ok(work.await),
            }
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(limit) => Err(Failure::new(state.stage, FetchError::TimedOut(limit.as_secs()))),
        };

        match &outcome {
            Ok(file) => tracing::info!(
                track_id,
                path = %file.path.display(),
                elapsed_ms = state.started.elapsed().as_millis() as u64,
                "Pipeline finished"
            ),
            Err(failure) => {
                tracing::warn!(
                    track_id,
                    stage = %failure.stage,
                    code = failure.cause.code(),
                    error = %failure.cause,
                    elapsed_ms = state.started.elapsed().as_millis() as u64,
                    "Pipeline failed"
                );
                if let Some(artifact) = state.artifact.as_deref().filter(|_| self.cleanup_on_failure) {
                    remove_artifact(artifact).await;
                }
            }
        }

        // Released only after cleanup so a waiting run never loses its artifact
        drop(state.guard.take());
        outcome
    }

    async fn execute<'a>(&'a self, state: &mut RunState<'a>) -> Result<FinalFile, Failure> {
        let track_id = state.track_id;

        state.enter(Stage::Resolving);
        let meta = self
            .retry
            .run("resolve", || self.catalog.resolve(track_id))
            .await
            .at(Stage::Resolving)?;

        state.enter(Stage::Locating);
        let artist = meta.artist_string();
        let found = self
            .retry
            .run("locate", || {
                self.locator.locate(&artist, &meta.title, meta.duration_seconds)
            })
            .await
            .at(Stage::Locating)?;

        let source_id = found.source_id.as_str();
        if let Some(locks) = &self.locks {
            state.guard = Some(locks.lock(source_id).await);
        }

        state.enter(Stage::Acquiring);
        state.artifact = Some(acquisition_path(&self.out_dir, source_id, self.fetcher.container()));
        let media = self
            .retry
            .run("acquire", || self.fetcher.acquire(source_id, &self.out_dir))
            .await
            .at(Stage::Acquiring)?;

        state.enter(Stage::Tagging);
        self.retry
            .run("tag", || self.tagger.write(&media, &meta))
            .await
            .at(Stage::Tagging)?;

        state.enter(Stage::Finalizing);
        let file = organizer::finalize(media, &meta, &self.out_dir)
            .await
            .at(Stage::Finalizing)?;
        state.artifact = None;

        Ok(file)
    }
}

async fn remove_artifact(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed failed artifact"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), "Failed to remove artifact: {}", e),
    }
}
