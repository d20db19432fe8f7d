//! Configuration system using TOML files and environment overrides.
//!
//! Settings are layered, later layers winning:
//! 1. Built-in defaults
//! 2. TOML file (`--config`, or the OS-standard config directory):
//!    - Windows: %APPDATA%\track-fetch\config.toml
//!    - macOS: ~/Library/Application Support/track-fetch/config.toml
//!    - Linux: ~/.config/track-fetch/config.toml
//! 3. A `.env` file in the working directory
//! 4. Process environment (`CLIENT_ID`, `CLIENT_SECRET`, `YT_API_KEY`,
//!    `SEARCH_BACKEND`, `INVIDIOUS_URL`, `SAVE_DIR`, `PROXY_URL`, `HOST`,
//!    `PORT`, `YTDLP_PATH`, `AUDIO_CONTAINER`, `REQUEST_TIMEOUT_SECS`)
//!
//! The resulting [`Config`] is built once at startup and passed by reference
//! into the pipeline and server constructors.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::Container;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API credentials for the catalog and search backends
    pub credentials: Credentials,

    /// Source search backend selection
    pub search: SearchConfig,

    /// Output directory and container
    pub output: OutputConfig,

    /// Outbound network settings
    pub network: NetworkConfig,

    /// HTTP listener settings
    pub server: ServerConfig,

    /// Orchestrator policies
    pub pipeline: PipelineConfig,
}

/// API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Catalog (Spotify) client id
    pub client_id: Option<String>,
    /// Catalog (Spotify) client secret
    pub client_secret: Option<String>,
    /// YouTube Data API key, required by the `data-api` backend
    pub youtube_api_key: Option<String>,
}

/// Which search backend the locator uses for this deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchBackendKind {
    /// Scrape the public results page
    #[default]
    Keyword,
    /// YouTube Data API v3
    DataApi,
    /// Invidious instance
    Invidious,
}

impl SearchBackendKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keyword" | "scrape" => Some(Self::Keyword),
            "data-api" | "data_api" | "youtube" => Some(Self::DataApi),
            "invidious" | "proxy" => Some(Self::Invidious),
            _ => None,
        }
    }
}

/// Source search settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub backend: SearchBackendKind,
    /// Base URL of the Invidious instance (e.g. `https://yewtu.be`)
    pub invidious_url: Option<String>,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving downloads and finalized files
    pub dir: PathBuf,
    /// Target audio container
    pub container: Container,
    /// Path to the yt-dlp executable (searched in common locations when unset)
    pub ytdlp_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("downloads"),
            container: Container::M4a,
            ytdlp_path: None,
        }
    }
}

/// Network settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Proxy URL applied to every outbound request and to yt-dlp
    pub proxy: Option<String>,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Orchestrator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Overall deadline per request in seconds (0 = unbounded)
    pub request_timeout_secs: u64,
    /// Attempts per network-bound stage; only transient errors are retried
    pub max_attempts: u32,
    /// Delay before the first retry, doubled on each further retry
    pub initial_backoff_ms: u64,
    /// Serialize acquire/tag/finalize per source id
    pub lock_sources: bool,
    /// Remove the acquisition artifact when a run fails
    pub cleanup_on_failure: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 300,
            max_attempts: 1,
            initial_backoff_ms: 500,
            lock_sources: true,
            cleanup_on_failure: false,
        }
    }
}

impl Config {
    /// Overlay values from an environment lookup (`std::env::var` in production).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("CLIENT_ID") {
            self.credentials.client_id = Some(v);
        }
        if let Some(v) = get("CLIENT_SECRET") {
            self.credentials.client_secret = Some(v);
        }
        if let Some(v) = get("YT_API_KEY") {
            self.credentials.youtube_api_key = Some(v);
        }
        if let Some(v) = get("SEARCH_BACKEND") {
            self.search.backend = SearchBackendKind::parse(&v)
                .ok_or_else(|| ConfigError::invalid("SEARCH_BACKEND", &v))?;
        }
        if let Some(v) = get("INVIDIOUS_URL") {
            self.search.invidious_url = Some(v);
        }
        if let Some(v) = get("SAVE_DIR") {
            self.output.dir = PathBuf::from(v);
        }
        if let Some(v) = get("AUDIO_CONTAINER") {
            self.output.container =
                Container::parse(&v).ok_or_else(|| ConfigError::invalid("AUDIO_CONTAINER", &v))?;
        }
        if let Some(v) = get("YTDLP_PATH") {
            self.output.ytdlp_path = Some(v);
        }
        if let Some(v) = get("PROXY_URL") {
            self.network.proxy = Some(v);
        }
        if let Some(v) = get("HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("PORT") {
            self.server.port = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("PORT", &v))?;
        }
        if let Some(v) = get("REQUEST_TIMEOUT_SECS") {
            self.pipeline.request_timeout_secs = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("REQUEST_TIMEOUT_SECS", &v))?;
        }

        Ok(())
    }

    /// Check that everything the configured components need is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

        if !present(&self.credentials.client_id) {
            return Err(ConfigError::Missing("CLIENT_ID"));
        }
        if !present(&self.credentials.client_secret) {
            return Err(ConfigError::Missing("CLIENT_SECRET"));
        }
        match self.search.backend {
            SearchBackendKind::DataApi if !present(&self.credentials.youtube_api_key) => {
                return Err(ConfigError::Missing("YT_API_KEY"));
            }
            SearchBackendKind::Invidious if !present(&self.search.invidious_url) => {
                return Err(ConfigError::Missing("INVIDIOUS_URL"));
            }
            _ => {}
        }
        if self.pipeline.max_attempts == 0 {
            return Err(ConfigError::invalid("max_attempts", "0"));
        }
        Ok(())
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("track-fetch"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from a TOML file.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

/// Load configuration from disk
///
/// Returns default config if the file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - environment variables may still
/// supply everything that's needed.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match load_from(&path) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            tracing::error!("{}", e);
            tracing::warn!("Using default configuration");
            Config::default()
        }
    }
}

/// Merge file, `.env` and environment layers without validating.
///
/// An explicitly given file must exist and parse; the default location is
/// optional.
pub fn layered(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match explicit {
        Some(path) => load_from(path)?,
        None => load(),
    };

    match dotenvy::dotenv() {
        Ok(path) => tracing::info!("Loaded environment from {:?}", path),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }

    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}

/// Build the startup configuration from every layer and validate it.
pub fn resolve(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let config = layered(explicit)?;
    config.validate()?;
    Ok(config)
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Failed to create output directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
