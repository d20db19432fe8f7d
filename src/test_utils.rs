//! Test utilities and fixtures for track-fetch tests.
//!
//! Provides a metadata factory, an audio fixture lofty can tag, and mock
//! implementations of every pipeline seam (catalog, search, fetch, artwork)
//! so pipeline and router tests never touch the network.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{MockCatalog, MockSearch, mock_track_metadata};
//!
//! let catalog = MockCatalog::with_track(mock_track_metadata());
//! let search = MockSearch::with_ids(&["yt1"]);
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use lofty::picture::MimeType;
use lofty::tag::{Accessor, ItemKey, Tag};
use parking_lot::Mutex;

use crate::acquire::{MediaFetcher, acquisition_path};
use crate::catalog::CatalogApi;
use crate::error::{FetchError, Result};
use crate::model::{AcquiredMedia, Container, TrackMetadata};
use crate::source::{SourceCandidate, SourceSearch};
use crate::tagger::{Artwork, ArtworkApi};

/// Creates a mock TrackMetadata with sensible defaults.
///
/// Customize with struct update syntax:
///
/// ```ignore
/// let custom = TrackMetadata {
///     title: "Custom Title".to_string(),
///     ..mock_track_metadata()
/// };
/// ```
pub fn mock_track_metadata() -> TrackMetadata {
    TrackMetadata {
        id: "abc".to_string(),
        title: "Test Track".to_string(),
        album: "Test Album".to_string(),
        release_year: Some("2020".to_string()),
        artists: vec!["Test Artist".to_string()],
        album_artists: vec!["Test Artist".to_string()],
        track_number: Some(1),
        total_tracks: Some(10),
        disc_number: Some(1),
        total_discs: None,
        artwork_url: None,
        duration_seconds: Some(180),
    }
}

// ============================================================================
// Audio fixtures
// ============================================================================

/// Smallest stream lofty accepts as MP3: 20 silent MPEG-1 Layer III frames
/// (128 kbps, 44.1 kHz, 417 bytes each), no tags.
pub fn mp3_fixture_bytes() -> Vec<u8> {
    const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];
    const FRAME_LEN: usize = 417;

    let mut bytes = Vec::with_capacity(FRAME_LEN * 20);
    for _ in 0..20 {
        bytes.extend_from_slice(&FRAME_HEADER);
        bytes.resize(bytes.len() + FRAME_LEN - FRAME_HEADER.len(), 0);
    }
    bytes
}

pub fn write_mp3_fixture(path: &Path) {
    std::fs::write(path, mp3_fixture_bytes()).unwrap();
}

/// Box `payload` as an MP4 atom: big-endian size, fourcc, payload.
fn atom(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + payload.len());
    out.extend_from_slice(&((8 + payload.len()) as u32).to_be_bytes());
    out.extend_from_slice(fourcc);
    out.extend_from_slice(payload);
    out
}

/// Smallest M4A lofty accepts: `ftyp`, one sound track
/// (`moov/trak/mdia{mdhd,hdlr}`) and a short `mdat`, no tags.
pub fn m4a_fixture_bytes() -> Vec<u8> {
    let mut ftyp = Vec::new();
    ftyp.extend_from_slice(b"M4A ");
    ftyp.extend_from_slice(&0u32.to_be_bytes());
    ftyp.extend_from_slice(b"M4A isommp42");

    // version 0: flags, creation, modification, timescale, duration, language, quality
    let mut mdhd = vec![0u8; 4 + 4 + 4];
    mdhd.extend_from_slice(&44_100u32.to_be_bytes());
    mdhd.extend_from_slice(&44_100u32.to_be_bytes());
    mdhd.extend_from_slice(&[0x55, 0xC4, 0, 0]);

    // version/flags, pre_defined, handler type, reserved, empty name
    let mut hdlr = vec![0u8; 8];
    hdlr.extend_from_slice(b"soun");
    hdlr.extend_from_slice(&[0u8; 12]);
    hdlr.push(0);

    let mdia = atom(b"mdia", &[atom(b"mdhd", &mdhd), atom(b"hdlr", &hdlr)].concat());
    let moov = atom(b"moov", &atom(b"trak", &mdia));

    [atom(b"ftyp", &ftyp), moov, atom(b"mdat", &[0u8; 64])].concat()
}

pub fn write_m4a_fixture(path: &Path) {
    std::fs::write(path, m4a_fixture_bytes()).unwrap();
}

/// Untagged audio in the given container
pub fn fixture_bytes(container: Container) -> Vec<u8> {
    match container {
        Container::M4a => m4a_fixture_bytes(),
        Container::Mp3 => mp3_fixture_bytes(),
    }
}

/// Year as read back from a tag.
///
/// ID3v2.4 stores the year in `TDRC`, which lofty surfaces as a recording
/// date rather than a year.
pub fn read_year(tag: &Tag) -> Option<u32> {
    tag.year().or_else(|| {
        tag.get_string(&ItemKey::RecordingDate)
            .and_then(|date| date.get(..4))
            .and_then(|year| year.parse().ok())
    })
}

// ============================================================================
// Catalog
// ============================================================================

/// Mock catalog keyed by track id.
pub struct MockCatalog {
    tracks: HashMap<String, TrackMetadata>,
    search_results: serde_json::Value,
    failure: Option<FetchError>,
    failures_left: AtomicU32,
    calls: AtomicU32,
}

impl MockCatalog {
    /// Catalog without any tracks
    pub fn empty() -> Self {
        Self {
            tracks: HashMap::new(),
            search_results: serde_json::json!({"tracks": {"items": []}}),
            failure: None,
            failures_left: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        }
    }

    /// Catalog holding one track under its own id
    pub fn with_track(meta: TrackMetadata) -> Self {
        let mut catalog = Self::empty();
        catalog.tracks.insert(meta.id.clone(), meta);
        catalog
    }

    /// Catalog holding several tracks, each under its own id
    pub fn with_tracks(tracks: impl IntoIterator<Item = TrackMetadata>) -> Self {
        let mut catalog = Self::empty();
        for meta in tracks {
            catalog.tracks.insert(meta.id.clone(), meta);
        }
        catalog
    }

    /// Fail the first `count` resolve calls with `error`
    pub fn failing_first(mut self, count: u32, error: FetchError) -> Self {
        self.failure = Some(error);
        self.failures_left = AtomicU32::new(count);
        self
    }

    pub fn with_search_results(mut self, results: serde_json::Value) -> Self {
        self.search_results = results;
        self
    }

    /// Number of resolve calls so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogApi for MockCatalog {
    async fn resolve(&self, track_id: &str) -> Result<TrackMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.failure
            && self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            return Err(error.clone());
        }

        self.tracks
            .get(track_id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(track_id.to_string()))
    }

    async fn search(&self, _query: &str) -> Result<serde_json::Value> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(self.search_results.clone())
    }
}

// ============================================================================
// Source search
// ============================================================================

/// Mock search backend that records every query it receives.
pub struct MockSearch {
    candidates: Vec<SourceCandidate>,
    error: Option<FetchError>,
    queries: Mutex<Vec<String>>,
}

impl MockSearch {
    /// Create a mock that returns no matches.
    pub fn no_matches() -> Self {
        Self::with_candidates(vec![])
    }

    /// Candidates with the given ids, in order, without durations
    pub fn with_ids(ids: &[&str]) -> Self {
        Self::with_candidates(ids.iter().map(|id| SourceCandidate::new(*id)).collect())
    }

    pub fn with_candidates(candidates: Vec<SourceCandidate>) -> Self {
        Self {
            candidates,
            error: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that returns an error.
    pub fn with_error(error: FetchError) -> Self {
        Self {
            error: Some(error),
            ..Self::no_matches()
        }
    }

    /// Queries received so far
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl SourceSearch for MockSearch {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn search(&self, query: &str) -> Result<Vec<SourceCandidate>> {
        self.queries.lock().push(query.to_string());
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(self.candidates.clone()),
        }
    }
}

// ============================================================================
// Fetcher
// ============================================================================

enum FetchBehavior {
    /// Write an untagged fixture matching the container
    Fixture,
    /// Write bytes no tag library can parse
    Garbage,
    /// Garbage on the first call, fixtures afterwards
    GarbageFirst,
    Fail(FetchError),
}

/// Mock fetcher writing fixtures to the real acquisition path.
pub struct MockFetcher {
    container: Container,
    behavior: FetchBehavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl MockFetcher {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            behavior: FetchBehavior::Fixture,
            delay: None,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: FetchError) -> Self {
        Self {
            behavior: FetchBehavior::Fail(error),
            ..Self::new(Container::M4a)
        }
    }

    /// Succeeds, but leaves an unparseable file behind
    pub fn corrupt_output(container: Container) -> Self {
        Self {
            behavior: FetchBehavior::Garbage,
            ..Self::new(container)
        }
    }

    /// Leaves an unparseable file on the first call only
    pub fn corrupt_first(container: Container) -> Self {
        Self {
            behavior: FetchBehavior::GarbageFirst,
            ..Self::new(container)
        }
    }

    /// Sleep before producing the file
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping acquire calls seen
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    async fn produce(&self, call: usize, source_id: &str, out_dir: &Path) -> Result<AcquiredMedia> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let local_path = acquisition_path(out_dir, source_id, self.container);
        match &self.behavior {
            FetchBehavior::Fixture => std::fs::write(&local_path, fixture_bytes(self.container))?,
            FetchBehavior::Garbage => std::fs::write(&local_path, b"not audio at all")?,
            FetchBehavior::GarbageFirst if call == 0 => std::fs::write(&local_path, b"not audio at all")?,
            FetchBehavior::GarbageFirst => std::fs::write(&local_path, fixture_bytes(self.container))?,
            FetchBehavior::Fail(error) => return Err(error.clone()),
        }

        Ok(AcquiredMedia {
            local_path,
            container: self.container,
            source_id: source_id.to_string(),
        })
    }
}

#[async_trait]
impl MediaFetcher for MockFetcher {
    async fn acquire(&self, source_id: &str, out_dir: &Path) -> Result<AcquiredMedia> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        let result = self.produce(call, source_id, out_dir).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn container(&self) -> Container {
        self.container
    }
}

// ============================================================================
// Artwork
// ============================================================================

/// Mock artwork source recording requested URLs.
pub struct MockArtwork {
    artwork: Option<Artwork>,
    requested: Mutex<Vec<String>>,
}

impl MockArtwork {
    /// Returns a tiny JPEG for every URL
    pub fn jpeg() -> Self {
        Self {
            artwork: Some(Artwork {
                data: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'],
                mime_type: Some(MimeType::Jpeg),
            }),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Fails every fetch with an upstream error
    pub fn failing() -> Self {
        Self {
            artwork: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }
}

#[async_trait]
impl ArtworkApi for MockArtwork {
    async fn fetch(&self, url: &str) -> Result<Artwork> {
        self.requested.lock().push(url.to_string());
        self.artwork
            .clone()
            .ok_or_else(|| FetchError::upstream("artwork returned HTTP 503"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lofty::file::TaggedFileExt;

    #[test]
    fn test_mock_track_metadata_defaults() {
        let meta = mock_track_metadata();
        assert_eq!(meta.title, "Test Track");
        assert_eq!(meta.artist_string(), "Test Artist");
        assert_eq!(meta.album, "Test Album");
        assert_eq!(meta.track_number, Some(1));
    }

    #[test]
    fn test_mp3_fixture_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.mp3");
        write_mp3_fixture(&path);
        assert!(lofty::read_from_path(&path).is_ok());
    }

    #[test]
    fn test_m4a_fixture_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.m4a");
        write_m4a_fixture(&path);

        let tagged = lofty::read_from_path(&path).unwrap();
        assert_eq!(tagged.file_type(), lofty::file::FileType::Mp4);
        assert!(tagged.primary_tag().is_none());
    }

    #[tokio::test]
    async fn test_mock_fetcher_writes_container_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = MockFetcher::new(Container::M4a);

        let media = fetcher.acquire("yt1", dir.path()).await.unwrap();

        assert_eq!(media.local_path, dir.path().join("yt1.m4a"));
        assert_eq!(std::fs::read(&media.local_path).unwrap(), m4a_fixture_bytes());
    }

    #[tokio::test]
    async fn test_mock_catalog_failing_first() {
        let catalog = MockCatalog::with_track(mock_track_metadata())
            .failing_first(1, FetchError::upstream("503"));

        assert!(catalog.resolve("abc").await.is_err());
        assert!(catalog.resolve("abc").await.is_ok());
        assert!(matches!(
            catalog.resolve("missing").await,
            Err(FetchError::NotFound(_))
        ));
        assert_eq!(catalog.calls(), 3);
    }
}
