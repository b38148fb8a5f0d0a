//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four raster operations every backend
//! must support: identify, resize, thumbnail, and placeholder. Every operation
//! works on in-memory bytes (an upload never touches disk before it is
//! persisted) and allocates its own raster surface, so calls are independent
//! and may run concurrently.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::data_url;
use super::params::{PlaceholderParams, ResizeParams, ThumbnailParams};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("Invalid operation: {0}")]
    InvalidParams(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// An encoded raster produced by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub mime_type: &'static str,
}

impl EncodedImage {
    /// Inline form, suitable for a record's image field.
    pub fn to_data_url(&self) -> String {
        data_url::to_data_url(&self.bytes, self.mime_type)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }
}

/// Trait for image processing backends.
///
/// Every backend must implement all four operations so the rest of the
/// codebase is backend-agnostic.
pub trait ImageBackend: Sync {
    /// Get image dimensions without producing any output.
    fn identify(&self, data: &[u8]) -> Result<Dimensions, BackendError>;

    /// Scale the whole image to exactly `params.width x params.height`.
    fn resize(&self, data: &[u8], params: &ResizeParams) -> Result<EncodedImage, BackendError>;

    /// Crop `params.crop` out of the image and scale it to `edge x edge`.
    fn thumbnail(
        &self,
        data: &[u8],
        params: &ThumbnailParams,
    ) -> Result<EncodedImage, BackendError>;

    /// Downscale to a tiny blurred square.
    fn placeholder(
        &self,
        data: &[u8],
        params: &PlaceholderParams,
    ) -> Result<EncodedImage, BackendError>;
}
