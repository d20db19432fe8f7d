//! Core data models for the acquisition pipeline.
//!
//! Defines the values handed from stage to stage: [`TrackMetadata`] from the
//! resolver, [`SourceMatch`] from the locator, [`AcquiredMedia`] from the
//! acquirer and [`FinalFile`] from the finalizer.
//!
//! All of these are request-scoped. `AcquiredMedia` is not `Clone`; the
//! artifact it names belongs to exactly one pipeline run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Separator used when joining artist names into a single tag field.
pub const ARTIST_SEPARATOR: &str = ", ";

/// Canonical track metadata resolved from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    /// Catalog identifier
    pub id: String,
    pub title: String,
    pub album: String,
    /// Four-digit year taken from the release date
    pub release_year: Option<String>,
    /// Credited artists, in catalog order (never empty)
    pub artists: Vec<String>,
    /// Album artists, in catalog order
    pub album_artists: Vec<String>,
    pub track_number: Option<u32>,
    pub total_tracks: Option<u32>,
    pub disc_number: Option<u32>,
    pub total_discs: Option<u32>,
    /// Largest artwork image available
    pub artwork_url: Option<String>,
    /// Track length, passed to the locator as a hint
    pub duration_seconds: Option<u32>,
}

impl TrackMetadata {
    /// Artists joined for tag fields and display names.
    pub fn artist_string(&self) -> String {
        self.artists.join(ARTIST_SEPARATOR)
    }

    /// Album artists joined, falling back to the track artists.
    pub fn album_artist_string(&self) -> String {
        if self.album_artists.is_empty() {
            self.artist_string()
        } else {
            self.album_artists.join(ARTIST_SEPARATOR)
        }
    }
}

/// Derive the release year from a catalog date string.
///
/// Takes everything before the first `-`, so `"2020-05-01"`, `"2020-05"` and
/// `"2020"` all yield `"2020"`. Empty input yields `None`.
pub fn release_year(date: &str) -> Option<String> {
    let year = date.split('-').next().unwrap_or_default().trim();
    if year.is_empty() {
        None
    } else {
        Some(year.to_string())
    }
}

/// Best-effort match on the source platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMatch {
    pub source_id: String,
    pub duration_seconds: Option<u32>,
}

/// Audio-only container produced by the acquirer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    #[default]
    M4a,
    Mp3,
}

impl Container {
    /// File extension (without the dot)
    pub fn extension(&self) -> &'static str {
        match self {
            Container::M4a => "m4a",
            Container::Mp3 => "mp3",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Container::M4a => "audio/mp4",
            Container::Mp3 => "audio/mpeg",
        }
    }

    /// Parse a container name or extension, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "m4a" | "mp4" | "aac" => Some(Container::M4a),
            "mp3" => Some(Container::Mp3),
            _ => None,
        }
    }
}

/// A downloaded artifact on disk, owned by the current pipeline run.
#[derive(Debug, PartialEq, Eq)]
pub struct AcquiredMedia {
    pub local_path: PathBuf,
    pub container: Container,
    pub source_id: String,
}

impl AcquiredMedia {
    pub fn path(&self) -> &Path {
        &self.local_path
    }
}

/// The delivered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalFile {
    pub path: PathBuf,
    /// `"{artists} - {title}"`, without extension
    pub display_name: String,
    pub mime_type: &'static str,
    pub container: Container,
}

impl FinalFile {
    /// Download filename offered to clients.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.display_name, self.container.extension())
    }
}
