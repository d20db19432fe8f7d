//! Tag writer - embeds catalog metadata and cover art into the artifact.
//!
//! Uses the lofty crate, so the same code writes MP4 atoms for `.m4a` and
//! ID3v2 frames for `.mp3`:
//!
//! | Field          | Source                                   |
//! |----------------|------------------------------------------|
//! | Title          | track title                              |
//! | Artist         | credited artists joined with `", "`      |
//! | Album          | album name                               |
//! | Album artist   | album artists (falls back to artists)    |
//! | Year           | first `-` segment of the release date    |
//! | Track / disc   | only when the catalog reports them       |
//! | Front cover    | artwork URL, replacing any existing one  |
//!
//! lofty is blocking, so the write runs on tokio's blocking pool.

mod artwork;

use std::path::Path;
use std::sync::Arc;

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag, TagExt, TagType};

use crate::error::{FetchError, Result};
use crate::model::{AcquiredMedia, TrackMetadata};

pub use artwork::{Artwork, ArtworkApi, ArtworkClient};

/// Writes metadata to acquired media
#[derive(Clone)]
pub struct TagWriter {
    artwork: Arc<dyn ArtworkApi>,
}

impl TagWriter {
    pub fn new(artwork: Arc<dyn ArtworkApi>) -> Self {
        Self { artwork }
    }

    /// Fetch artwork (if any) and write every tag in one save.
    ///
    /// Artwork failures fail the stage; a track without artwork is written
    /// without a picture.
    pub async fn write(&self, media: &AcquiredMedia, meta: &TrackMetadata) -> Result<()> {
        let artwork = match meta.artwork_url.as_deref() {
            Some(url) => Some(self.artwork.fetch(url).await?),
            None => {
                tracing::debug!(track_id = %meta.id, "No artwork for track");
                None
            }
        };

        let path = media.path().to_path_buf();
        let meta = meta.clone();
        tokio::task::spawn_blocking(move || write_tags(&path, &meta, artwork.as_ref()))
            .await
            .map_err(|e| FetchError::Io(format!("tag writer task failed: {}", e)))?
    }
}

/// Write tags to a file synchronously.
pub fn write_tags(path: &Path, meta: &TrackMetadata, artwork: Option<&Artwork>) -> Result<()> {
    let mut tagged_file = Probe::open(path)
        .map_err(|e| FetchError::corrupt(path, e.to_string()))?
        .read()
        .map_err(|e| FetchError::corrupt(path, e.to_string()))?;

    // Get the primary tag type for this format, or create one
    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let Some(tag) = tagged_file.tag_mut(tag_type) else {
        return Err(FetchError::corrupt(path, "container does not accept tags"));
    };

    tag.set_title(meta.title.clone());
    tag.set_artist(meta.artist_string());
    tag.set_album(meta.album.clone());
    tag.insert_text(ItemKey::AlbumArtist, meta.album_artist_string());

    if let Some(year) = meta.release_year.as_deref().and_then(|y| y.parse::<u32>().ok()) {
        tag.set_year(year);
    }
    if let Some(track) = meta.track_number {
        tag.set_track(track);
    }
    if let Some(total) = meta.total_tracks {
        tag.set_track_total(total);
    }
    if let Some(disc) = meta.disc_number {
        tag.set_disk(disc);
    }
    if let Some(total) = meta.total_discs {
        tag.set_disk_total(total);
    }

    if let Some(artwork) = artwork {
        match artwork.mime_type.as_ref().filter(|mime| embeddable(tag_type, mime)) {
            Some(mime) => {
                tag.remove_picture_type(PictureType::CoverFront);
                tag.push_picture(Picture::new_unchecked(
                    PictureType::CoverFront,
                    Some(mime.clone()),
                    None,
                    artwork.data.clone(),
                ));
            }
            None => tracing::warn!(
                path = %path.display(),
                mime = ?artwork.mime_type,
                "Skipping cover art the container cannot carry"
            ),
        }
    }

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| FetchError::Io(format!("failed to save tags to {}: {}", path.display(), e)))?;

    tracing::debug!(path = %path.display(), "Wrote tags");
    Ok(())
}

/// Whether `tag_type` can store a picture of this type as-is
fn embeddable(tag_type: TagType, mime: &MimeType) -> bool {
    match tag_type {
        TagType::Mp4Ilst => matches!(
            mime,
            MimeType::Jpeg | MimeType::Png | MimeType::Bmp | MimeType::Gif
        ),
        _ => true,
    }
}
