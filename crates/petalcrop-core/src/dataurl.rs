//! Base64 data-URL encoding and decoding.
//!
//! Data URLs are how images travel between the upload control, the crop
//! preview and the registration payload (`user_image`).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

const BASE64_MARKER: &str = ";base64,";

/// Errors from reading a file or parsing a data URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// The underlying blob/file read failed.
    #[error("Failed to read file: {0}")]
    Io(String),

    /// The string does not start with `data:`.
    #[error("Not a data URL")]
    NotDataUrl,

    /// Only base64 data URLs are produced and accepted.
    #[error("Data URL is not base64 encoded")]
    MissingBase64Marker,

    /// The payload is not valid base64.
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),
}

/// A parsed data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Render as a `data:<mime>;base64,<payload>` string.
    pub fn to_url(&self) -> String {
        encode_data_url(&self.mime_type, &self.bytes)
    }
}

/// Encode bytes as a base64 data URL.
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{}{}{}", mime_type, BASE64_MARKER, STANDARD.encode(bytes))
}

/// Parse a base64 data URL back into its MIME type and bytes.
pub fn decode_data_url(url: &str) -> Result<DataUrl, ReadError> {
    let rest = url.trim().strip_prefix("data:").ok_or(ReadError::NotDataUrl)?;
    let marker = rest
        .find(BASE64_MARKER)
        .ok_or(ReadError::MissingBase64Marker)?;

    let mime_type = &rest[..marker];
    let payload = &rest[marker + BASE64_MARKER.len()..];

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| ReadError::InvalidBase64(e.to_string()))?;

    Ok(DataUrl::new(mime_type, bytes))
}
