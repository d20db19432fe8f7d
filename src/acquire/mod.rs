//! Media acquisition - fetch a source item as an audio-only file.
//!
//! [`YtDlp`] shells out to the `yt-dlp` command-line tool, which handles
//! stream selection, download and extraction (via ffmpeg) in one call.
//! The child process is killed if the pipeline future is dropped, so a
//! request deadline also stops the download.
//!
//! Artifacts are written as `{out_dir}/{source_id}.{ext}`. Two runs on the
//! same source id target the same path; the orchestrator serializes them.

mod tools;

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::{NetworkConfig, OutputConfig};
use crate::error::{FetchError, Result};
use crate::model::{AcquiredMedia, Container};

pub use tools::{ffmpeg_version, find_ytdlp, ytdlp_version};

/// Fetch capability used by the pipeline.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download `source_id` as audio into `out_dir`.
    async fn acquire(&self, source_id: &str, out_dir: &Path) -> Result<AcquiredMedia>;

    /// Container every artifact from this fetcher uses
    fn container(&self) -> Container;
}

/// Where an artifact for `source_id` lands
pub fn acquisition_path(out_dir: &Path, source_id: &str, container: Container) -> PathBuf {
    out_dir.join(format!("{}.{}", source_id, container.extension()))
}

/// Watch URL for a source id
pub fn watch_url(source_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", source_id)
}

/// yt-dlp based fetcher
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    container: Container,
    proxy: Option<String>,
}

impl YtDlp {
    pub fn new(program: impl Into<String>, container: Container) -> Self {
        Self {
            program: program.into(),
            container,
            proxy: None,
        }
    }

    /// Route yt-dlp's own traffic through a proxy
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy.filter(|p| !p.is_empty());
        self
    }

    /// Build from settings, falling back to common install locations.
    pub fn from_config(output: &OutputConfig, network: &NetworkConfig) -> Self {
        let program = output
            .ytdlp_path
            .clone()
            .or_else(|| find_ytdlp().map(str::to_string))
            .unwrap_or_else(|| {
                tracing::warn!("yt-dlp not found in common locations; downloads will fail until it is installed");
                "yt-dlp".to_string()
            });

        Self::new(program, output.container).with_proxy(network.proxy.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn args(&self, source_id: &str, out_dir: &Path) -> Vec<String> {
        let template = out_dir.join(format!("{}.%(ext)s", source_id));
        let mut args = vec![
            "--format".to_string(),
            "bestaudio/best".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            self.container.extension().to_string(),
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "--force-overwrites".to_string(),
            "--output".to_string(),
            template.to_string_lossy().into_owned(),
        ];
        if let Some(proxy) = &self.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }
        args.push("--".to_string());
        args.push(watch_url(source_id));
        args
    }
}

#[async_trait]
impl MediaFetcher for YtDlp {
    async fn acquire(&self, source_id: &str, out_dir: &Path) -> Result<AcquiredMedia> {
        if !is_valid_source_id(source_id) {
            return Err(FetchError::Unavailable(format!(
                "malformed source id {:?}",
                source_id
            )));
        }

        tokio::fs::create_dir_all(out_dir).await?;

        tracing::debug!(source_id, program = %self.program, "Starting yt-dlp");
        let output = Command::new(&self.program)
            .args(self.args(source_id, out_dir))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => FetchError::upstream(format!(
                    "yt-dlp not found at {:?}. Install it: https://github.com/yt-dlp/yt-dlp",
                    self.program
                )),
                _ => FetchError::upstream(format!("failed to run yt-dlp: {}", e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(source_id, stderr = %stderr.trim(), "yt-dlp failed");
            return Err(classify_failure(&stderr));
        }

        let local_path = acquisition_path(out_dir, source_id, self.container);
        if !tokio::fs::try_exists(&local_path).await.unwrap_or(false) {
            return Err(FetchError::Transcode(format!(
                "yt-dlp finished but {} was not produced",
                local_path.display()
            )));
        }

        Ok(AcquiredMedia {
            local_path,
            container: self.container,
            source_id: source_id.to_string(),
        })
    }

    fn container(&self) -> Container {
        self.container
    }
}

/// Source ids are URL-safe base64-ish tokens; anything else could escape
/// the output directory.
fn is_valid_source_id(source_id: &str) -> bool {
    !source_id.is_empty()
        && source_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Map yt-dlp's stderr to the error taxonomy
fn classify_failure(stderr: &str) -> FetchError {
    const UNAVAILABLE: &[&str] = &[
        "video unavailable",
        "private video",
        "has been removed",
        "not available in your country",
        "sign in to confirm your age",
        "members-only",
        "copyright",
        "this live event will begin",
    ];
    const TRANSCODE: &[&str] = &[
        "ffprobe and ffmpeg not found",
        "ffmpeg not found",
        "postprocessing:",
        "audio conversion failed",
    ];

    let lower = stderr.to_ascii_lowercase();
    let message = last_error_line(stderr);

    if lower.contains("http error 429") || lower.contains("too many requests") {
        FetchError::RateLimited("yt-dlp".to_string())
    } else if UNAVAILABLE.iter().any(|p| lower.contains(p)) {
        FetchError::Unavailable(message)
    } else if TRANSCODE.iter().any(|p| lower.contains(p)) {
        FetchError::Transcode(message)
    } else {
        FetchError::upstream(format!("yt-dlp failed: {}", message))
    }
}

fn last_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|l| l.contains("ERROR"))
        .or_else(|| stderr.lines().rev().find(|l| !l.trim().is_empty()))
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| "no output".to_string())
}
