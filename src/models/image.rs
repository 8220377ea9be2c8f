use crate::error::{HaulError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_MEDIA_TYPE: &str = "image/png";

/// An image as media type plus raw bytes. On the wire it travels as a
/// `data:<mediaType>;base64,<payload>` envelope.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    media_type: String,
    bytes: Vec<u8>,
}

/// Sniffs the media type from the leading bytes.
pub fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|format| format.to_mime_type())
}

/// Media type implied by a file extension.
pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    image::ImageFormat::from_path(path)
        .ok()
        .map(|format| format.to_mime_type())
}

/// Returns the media type of a `data:<type>;base64` header, if well formed.
fn parse_header(header: &str) -> Option<&str> {
    let rest = header.strip_prefix("data:")?;
    let rest = rest.strip_suffix(";base64")?;
    let media_type = rest.split(';').next()?.trim();
    let (kind, subtype) = media_type.split_once('/')?;
    if kind.is_empty() || subtype.is_empty() {
        return None;
    }
    Some(media_type)
}

fn decode(data: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(data.trim())
        .map_err(|e| HaulError::InvalidRequest(format!("Malformed image payload: {}", e)))
}

impl ImagePayload {
    pub fn new(media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Wraps raw bytes, sniffing the media type and falling back to PNG.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let media_type = sniff_media_type(&bytes).unwrap_or(DEFAULT_MEDIA_TYPE);
        Self::new(media_type, bytes)
    }

    pub fn from_base64(media_type: impl Into<String>, data: &str) -> Result<Self> {
        Ok(Self::new(media_type, decode(data)?))
    }

    /// Parses an envelope, defaulting the media type to `image/png` when the
    /// header is malformed or absent. Bare base64 is accepted.
    pub fn from_data_url_lenient(input: &str) -> Result<Self> {
        let input = input.trim();
        let (media_type, data) = match input.split_once(',') {
            Some((header, data)) => (parse_header(header).unwrap_or(DEFAULT_MEDIA_TYPE), data),
            None => (DEFAULT_MEDIA_TYPE, input),
        };
        Self::from_base64(media_type, data)
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }
}

impl FromStr for ImagePayload {
    type Err = HaulError;

    /// Strict parse: the `data:<type>;base64,` header is required.
    fn from_str(input: &str) -> Result<Self> {
        let input = input.trim();
        let (header, data) = input
            .split_once(',')
            .ok_or_else(|| HaulError::InvalidRequest("Image payload is not a data URL".into()))?;
        let media_type = parse_header(header).ok_or_else(|| {
            HaulError::InvalidRequest("Image payload lacks a valid media type prefix".into())
        })?;
        Self::from_base64(media_type, data)
    }
}

impl fmt::Display for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_data_url())
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Serialize for ImagePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_url())
    }
}

impl<'de> Deserialize<'de> for ImagePayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
