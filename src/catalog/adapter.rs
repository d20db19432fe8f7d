//! Adapter layer: Convert catalog DTOs to domain models
//!
//! This is the ONLY place catalog DTO types become domain types. If the
//! catalog changes its response format, only this file and dto.rs change.

use super::dto;
use crate::error::{FetchError, Result};
use crate::model::{TrackMetadata, release_year};

/// Convert a catalog track into [`TrackMetadata`].
///
/// Fails with [`FetchError::MissingArtist`] when no artist is credited: such
/// a track cannot be tagged meaningfully.
pub fn to_metadata(track: dto::Track) -> Result<TrackMetadata> {
    let artists = names(&track.artists);
    if artists.is_empty() {
        return Err(FetchError::MissingArtist(track.id));
    }

    let album_artists = names(&track.album.artists);
    let artwork_url = largest_image(&track.album.images);

    Ok(TrackMetadata {
        id: track.id,
        title: track.name,
        album: track.album.name,
        release_year: track.album.release_date.as_deref().and_then(release_year),
        artists,
        album_artists,
        track_number: positive(track.track_number),
        total_tracks: positive(track.album.total_tracks),
        disc_number: positive(track.disc_number),
        // Not present on the track object
        total_discs: None,
        artwork_url,
        duration_seconds: track
            .duration_ms
            .map(|ms| ((ms + 500) / 1000) as u32),
    })
}

/// Artist names in credit order, skipping blanks
fn names(artists: &[dto::SimpleArtist]) -> Vec<String> {
    artists
        .iter()
        .map(|a| a.name.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}

/// Pick the widest image; the API lists images widest first, so the first
/// image wins when widths are missing.
fn largest_image(images: &[dto::Image]) -> Option<String> {
    images
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| {
            a.width
                .unwrap_or(0)
                .cmp(&b.width.unwrap_or(0))
                .then(ib.cmp(ia))
        })
        .map(|(_, img)| img.url.clone())
}

/// Zero means "unknown" for catalog numbering
fn positive(value: Option<u32>) -> Option<u32> {
    value.filter(|&n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artist(name: &str) -> dto::SimpleArtist {
        dto::SimpleArtist {
            id: None,
            name: name.to_string(),
        }
    }

    fn image(url: &str, width: Option<u32>) -> dto::Image {
        dto::Image {
            url: url.to_string(),
            width,
            height: width,
        }
    }

    fn track(artists: Vec<dto::SimpleArtist>) -> dto::Track {
        dto::Track {
            id: "abc123".to_string(),
            name: "Song".to_string(),
            artists,
            album: dto::Album {
                id: None,
                name: "Album".to_string(),
                release_date: Some("2020-05-01".to_string()),
                release_date_precision: Some("day".to_string()),
                total_tracks: Some(12),
                artists: vec![artist("Album Artist")],
                images: vec![image("https://img/640", Some(640)), image("https://img/64", Some(64))],
            },
            track_number: Some(3),
            disc_number: Some(1),
            duration_ms: Some(180_400),
        }
    }

    #[test]
    fn test_to_metadata_maps_fields() {
        let meta = to_metadata(track(vec![artist("Artist")])).unwrap();

        assert_eq!(meta.id, "abc123");
        assert_eq!(meta.title, "Song");
        assert_eq!(meta.album, "Album");
        assert_eq!(meta.release_year.as_deref(), Some("2020"));
        assert_eq!(meta.artists, vec!["Artist"]);
        assert_eq!(meta.album_artists, vec!["Album Artist"]);
        assert_eq!(meta.track_number, Some(3));
        assert_eq!(meta.total_tracks, Some(12));
        assert_eq!(meta.disc_number, Some(1));
        assert_eq!(meta.total_discs, None);
        assert_eq!(meta.artwork_url.as_deref(), Some("https://img/640"));
        assert_eq!(meta.duration_seconds, Some(180));
    }

    #[test]
    fn test_artists_keep_catalog_order() {
        let meta = to_metadata(track(vec![
            artist("Queen"),
            artist("David Bowie"),
            artist("Annie Lennox"),
        ]))
        .unwrap();

        assert_eq!(meta.artists, vec!["Queen", "David Bowie", "Annie Lennox"]);
        assert_eq!(meta.artist_string(), "Queen, David Bowie, Annie Lennox");
    }

    #[test]
    fn test_no_artists_fails() {
        let err = to_metadata(track(vec![])).unwrap_err();
        assert!(matches!(err, FetchError::MissingArtist(ref id) if id == "abc123"));
    }

    #[test]
    fn test_blank_artist_names_do_not_count() {
        let err = to_metadata(track(vec![artist("  ")])).unwrap_err();
        assert!(matches!(err, FetchError::MissingArtist(_)));
    }

    #[test]
    fn test_zero_numbers_are_absent() {
        let mut t = track(vec![artist("Artist")]);
        t.track_number = Some(0);
        t.album.total_tracks = Some(0);
        let meta = to_metadata(t).unwrap();
        assert_eq!(meta.track_number, None);
        assert_eq!(meta.total_tracks, None);
    }

    #[test]
    fn test_largest_image_prefers_width() {
        let images = vec![image("small", Some(64)), image("large", Some(640)), image("mid", Some(300))];
        assert_eq!(largest_image(&images).as_deref(), Some("large"));
    }

    #[test]
    fn test_largest_image_falls_back_to_first() {
        let images = vec![image("first", None), image("second", None)];
        assert_eq!(largest_image(&images).as_deref(), Some("first"));
        assert_eq!(largest_image(&[]), None);
    }

    #[test]
    fn test_year_only_release_date() {
        let mut t = track(vec![artist("Artist")]);
        t.album.release_date = Some("1975".to_string());
        let meta = to_metadata(t).unwrap();
        assert_eq!(meta.release_year.as_deref(), Some("1975"));
    }
}
