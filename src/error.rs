//! Application-wide error types.
//!
//! Every pipeline stage reports failures through one shared taxonomy,
//! [`FetchError`]. The orchestrator pairs the error with the [`Stage`] that
//! produced it to form the single reported outcome, [`Failure`].
//!
//! # Design
//!
//! - [`FetchError`]: what went wrong (absence, transient upstream trouble,
//!   local media/filesystem trouble)
//! - [`Failure`]: where it went wrong
//! - Binary edges (`main`, CLI commands) use `anyhow`
//!
//! # Example
//!
//! ```ignore
//! use track_fetch::error::{FetchError, Result};
//!
//! async fn resolve(id: &str) -> Result<TrackMetadata> {
//!     let dto = client.get_track(id).await?; // FetchError propagates
//!     adapter::to_metadata(dto)
//! }
//! ```

use std::fmt;
use std::path::PathBuf;

/// Result type used by every pipeline component.
pub type Result<T> = std::result::Result<T, FetchError>;

/// Errors that can occur while fetching and preparing a track.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The catalog has no track with this id
    #[error("Track not found: {0}")]
    NotFound(String),

    /// The catalog returned the track without any credited artist
    #[error("Track {0} has no credited artist")]
    MissingArtist(String),

    /// The search backend returned no candidates
    #[error("No source found for query: {0}")]
    NoMatch(String),

    /// The source exists but cannot be fetched (removed, private, restricted)
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// Fetch succeeded but extraction into the target container failed
    #[error("Transcode failed: {0}")]
    Transcode(String),

    /// The container could not be parsed for tag writing
    #[error("Corrupt media {path}: {message}")]
    CorruptMedia { path: PathBuf, message: String },

    /// Local filesystem failure
    #[error("IO error: {0}")]
    Io(String),

    /// Generic transport/authentication failure from a remote dependency
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// A remote dependency asked us to slow down
    #[error("Rate limited by {0} - try again later")]
    RateLimited(String),

    /// The overall request deadline elapsed
    #[error("Timed out after {0}s")]
    TimedOut(u64),
}

impl FetchError {
    /// Create a corrupt media error.
    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CorruptMedia {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an upstream error.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    /// Whether retrying the same call could plausibly succeed.
    ///
    /// Absence (`NotFound`, `NoMatch`, `Unavailable`) is never transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::RateLimited(_))
    }

    /// Short machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::MissingArtist(_) => "MISSING_ARTIST",
            Self::NoMatch(_) => "NO_MATCH",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Transcode(_) => "TRANSCODE_ERROR",
            Self::CorruptMedia { .. } => "CORRUPT_MEDIA",
            Self::Io(_) => "IO_ERROR",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::TimedOut(_) => "TIMED_OUT",
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Resolving,
    Locating,
    Acquiring,
    Tagging,
    Finalizing,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Resolving => "resolving",
            Stage::Locating => "locating",
            Stage::Acquiring => "acquiring",
            Stage::Tagging => "tagging",
            Stage::Finalizing => "finalizing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a pipeline run: the stage and its unchanged cause.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{stage} failed: {cause}")]
pub struct Failure {
    pub stage: Stage,
    #[source]
    pub cause: FetchError,
}

impl Failure {
    pub fn new(stage: Stage, cause: FetchError) -> Self {
        Self { stage, cause }
    }
}

/// Extension trait for tagging a stage result with its stage.
pub trait StageExt<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, Failure>;
}

impl<T> StageExt<T> for Result<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, Failure> {
        self.map_err(|cause| Failure::new(stage, cause))
    }
}
