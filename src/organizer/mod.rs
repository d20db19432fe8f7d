//! Finalizer - renames a tagged artifact to its delivery name.
//!
//! The delivered file is `{out_dir}/{artists} - {title}.{ext}`. Names are
//! derived only from metadata, so finalizing the same track twice lands on
//! the same path and the second rename replaces the first file.
//!
//! # Features
//! - Path-hostile characters replaced with `_`
//! - Names capped so `{name}.{ext}` fits the 255-byte filename limit
//! - Atomic rename within the output directory
//! - MIME type carried from the container

use std::path::{Path, PathBuf};

use crate::error::{FetchError, Result};
use crate::model::{AcquiredMedia, Container, FinalFile, TrackMetadata};

/// Longest display name in bytes; leaves room for `.` and a 4-byte extension
pub const MAX_NAME_BYTES: usize = 255 - 5;

/// Human-readable name, without extension
pub fn display_name(meta: &TrackMetadata) -> String {
    let name = sanitize_filename(&format!("{} - {}", meta.artist_string(), meta.title));
    truncate_name(&name, MAX_NAME_BYTES).to_string()
}

/// Cut `name` to at most `max_bytes` on a char boundary, dropping trailing
/// whitespace and dots left at the cut.
fn truncate_name(name: &str, max_bytes: usize) -> &str {
    if name.len() <= max_bytes {
        return name;
    }
    let mut end = max_bytes;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].trim_end_matches(|c: char| c.is_whitespace() || c == '.')
}

/// Where the finalized file for `meta` lands
pub fn final_path(out_dir: &Path, meta: &TrackMetadata, container: Container) -> PathBuf {
    out_dir.join(format!("{}.{}", display_name(meta), container.extension()))
}

/// Move the artifact to its delivery name, replacing any earlier file.
///
/// Consumes the media: after this call the acquisition path no longer
/// exists.
pub async fn finalize(media: AcquiredMedia, meta: &TrackMetadata, out_dir: &Path) -> Result<FinalFile> {
    let name = display_name(meta);
    let dest_path = final_path(out_dir, meta, media.container);

    // Same directory, so rename is atomic and overwrites an existing file
    tokio::fs::rename(media.path(), &dest_path).await.map_err(|e| {
        FetchError::Io(format!(
            "failed to move {} to {}: {}",
            media.path().display(),
            dest_path.display(),
            e
        ))
    })?;

    tracing::debug!(from = %media.path().display(), to = %dest_path.display(), "Finalized file");

    Ok(FinalFile {
        path: dest_path,
        display_name: name,
        mime_type: media.container.mime_type(),
        container: media.container,
    })
}

/// Sanitizes a filename by replacing invalid characters
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect()
}
