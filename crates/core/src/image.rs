//! Self-contained inline image references.
//!
//! Images attached to a presentation are stored as `data:` URIs so the
//! presentation can be serialized or dropped without touching the file system.

use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// An inline image, encoded as `data:<mime>;base64,<payload>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageRef {
    uri: String,
}

impl ImageRef {
    /// Encode raw image bytes, sniffing the format from the content.
    ///
    /// Bytes that are not a recognizable raster image are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let format = image::guess_format(bytes)
            .map_err(|_| Error::UnsupportedFormat("file is not a recognized image".to_string()))?;
        let mime = mime_for(format).ok_or_else(|| {
            Error::UnsupportedFormat(format!("image format {:?} is not supported", format))
        })?;

        log::debug!("Encoding {} byte {} image", bytes.len(), mime);

        Ok(Self {
            uri: format!("{}{}{}{}", DATA_PREFIX, mime, BASE64_MARKER, STANDARD.encode(bytes)),
        })
    }

    /// Parse an existing data URI.
    pub fn from_data_uri(uri: impl Into<String>) -> Result<Self> {
        let uri = uri.into();
        let (mime, payload) = split_data_uri(&uri)
            .ok_or_else(|| Error::UnsupportedFormat("not a base64 data URI".to_string()))?;
        if !mime.starts_with("image/") {
            return Err(Error::UnsupportedFormat(format!("{} is not an image type", mime)));
        }
        if payload.is_empty() {
            return Err(Error::EmptyOrUnreadable("image data URI has no payload".to_string()));
        }
        Ok(Self { uri })
    }

    /// The full data URI.
    pub fn as_data_uri(&self) -> &str {
        &self.uri
    }

    /// The MIME type declared by the data URI, e.g. `image/png`.
    pub fn mime(&self) -> &str {
        split_data_uri(&self.uri).map(|(mime, _)| mime).unwrap_or_default()
    }

    /// Decode the payload back into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let (_, payload) = split_data_uri(&self.uri)
            .ok_or_else(|| Error::Unexpected("malformed image data URI".to_string()))?;
        STANDARD
            .decode(payload)
            .map_err(|e| Error::EmptyOrUnreadable(format!("invalid image payload: {}", e)))
    }

    /// Pixel dimensions, when the image header can be read.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let bytes = self.decode().ok()?;
        image::io::Reader::new(Cursor::new(bytes))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()
    }
}

impl TryFrom<String> for ImageRef {
    type Error = Error;

    fn try_from(uri: String) -> Result<Self> {
        Self::from_data_uri(uri)
    }
}

impl From<ImageRef> for String {
    fn from(image: ImageRef) -> Self {
        image.uri
    }
}

/// Split `data:<mime>;base64,<payload>` into its MIME type and payload.
fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix(DATA_PREFIX)?;
    let marker = rest.find(BASE64_MARKER)?;
    Some((&rest[..marker], &rest[marker + BASE64_MARKER.len()..]))
}

fn mime_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Bmp => Some("image/bmp"),
        ImageFormat::Tiff => Some("image/tiff"),
        _ => None,
    }
}
