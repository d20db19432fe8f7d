//! Artwork download.
//!
//! Fetches the cover image referenced by the catalog metadata. The image
//! type is sniffed from magic bytes first since image CDNs frequently send
//! `application/octet-stream`. Bytes that are recognizably no image get no
//! type at all, and the tag writer leaves them out.

use async_trait::async_trait;
use lofty::picture::MimeType;

use crate::error::{FetchError, Result};
use crate::net::status_error;

/// A downloaded cover image
#[derive(Debug, Clone, PartialEq)]
pub struct Artwork {
    pub data: Vec<u8>,
    /// `None` when neither the bytes nor the header name an image type
    pub mime_type: Option<MimeType>,
}

impl Artwork {
    /// Wrap raw bytes, detecting the image type
    pub fn from_bytes(data: Vec<u8>, content_type: Option<&str>) -> Self {
        let mime_type = detect_mime(&data, content_type);
        Self { data, mime_type }
    }
}

/// Artwork fetch capability.
#[async_trait]
pub trait ArtworkApi: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Artwork>;
}

/// HTTP artwork client
pub struct ArtworkClient {
    http_client: reqwest::Client,
}

impl ArtworkClient {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl ArtworkApi for ArtworkClient {
    async fn fetch(&self, url: &str) -> Result<Artwork> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::upstream(format!("artwork request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("artwork", status));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::upstream(format!("artwork download failed: {}", e)))?;

        if bytes.is_empty() {
            return Err(FetchError::upstream(format!("artwork at {} is empty", url)));
        }

        tracing::debug!(url, size = bytes.len(), "Fetched artwork");
        Ok(Artwork::from_bytes(bytes.to_vec(), content_type.as_deref()))
    }
}

/// Detect image MIME type from magic bytes, then the response header
fn detect_mime(data: &[u8], content_type: Option<&str>) -> Option<MimeType> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(MimeType::Jpeg);
    }
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return Some(MimeType::Png);
    }
    if data.starts_with(b"GIF8") {
        return Some(MimeType::Gif);
    }
    if data.starts_with(b"BM") {
        return Some(MimeType::Bmp);
    }
    if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        return Some(MimeType::Tiff);
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some(MimeType::Unknown("image/webp".to_string()));
    }

    let header = content_type.map(|c| c.split(';').next().unwrap_or(c).trim().to_ascii_lowercase())?;
    match header.as_str() {
        "image/jpeg" | "image/jpg" => Some(MimeType::Jpeg),
        "image/png" => Some(MimeType::Png),
        "image/gif" => Some(MimeType::Gif),
        "image/bmp" => Some(MimeType::Bmp),
        "image/tiff" => Some(MimeType::Tiff),
        other if other.starts_with("image/") => Some(MimeType::Unknown(header)),
        _ => None,
    }
}
