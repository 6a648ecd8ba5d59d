//! `data:` URL encoding for inline image payloads.
//!
//! Generated images come back from the remote capability as base64 blobs
//! and are carried around as `data:<mime>;base64,<payload>` URLs, the same
//! form a browser can display directly.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::CoreError;

const PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// Decoded contents of a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Build a base64 `data:` URL.
pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    format!("{PREFIX}{mime_type}{BASE64_MARKER},{}", STANDARD.encode(bytes))
}

/// Build a `data:` URL from an already base64-encoded payload.
pub fn from_base64(mime_type: &str, payload: &str) -> String {
    format!("{PREFIX}{mime_type}{BASE64_MARKER},{payload}")
}

/// Whether `url` uses the `data:` scheme.
pub fn is_data_url(url: &str) -> bool {
    url.starts_with(PREFIX)
}

/// Decode a base64 `data:` URL.
///
/// Only base64 payloads are accepted; percent-encoded text payloads never
/// carry images in this system.
pub fn decode(url: &str) -> Result<DataUrl, CoreError> {
    let rest = url
        .strip_prefix(PREFIX)
        .ok_or_else(|| CoreError::Validation("Not a data URL".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| CoreError::Validation("Data URL has no payload separator".into()))?;
    let mime_type = meta
        .strip_suffix(BASE64_MARKER)
        .ok_or_else(|| CoreError::Validation("Data URL payload must be base64".into()))?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| CoreError::Validation(format!("Invalid base64 payload: {e}")))?;

    Ok(DataUrl {
        mime_type: mime_type.to_string(),
        bytes,
    })
}
