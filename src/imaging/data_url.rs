//! `data:` URI encoding for inline image storage.
//!
//! When no object storage is configured, a record's image field holds the
//! image itself as `data:<mime>;base64,<payload>`. Only the base64 form is
//! produced; parsing also accepts it only, since that is the only form this
//! crate ever writes.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("not a data URL")]
    MissingScheme,
    #[error("data URL has no payload separator")]
    MissingPayload,
    #[error("data URL is not base64-encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Payload(String),
}

/// Encode bytes as a base64 `data:` URI.
pub fn to_data_url(bytes: &[u8], mime_type: &str) -> String {
    format!("data:{};base64,{}", mime_type, BASE64_STANDARD.encode(bytes))
}

/// A decoded `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Decode a base64 `data:` URI back into its MIME type and bytes.
pub fn parse_data_url(url: &str) -> Result<DataUrl, DataUrlError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or(DataUrlError::MissingScheme)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingPayload)?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or(DataUrlError::NotBase64)?;

    let bytes = BASE64_STANDARD
        .decode(payload.trim())
        .map_err(|e| DataUrlError::Payload(e.to_string()))?;

    Ok(DataUrl {
        mime_type: mime_type.to_string(),
        bytes,
    })
}
