//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They take
//! configuration, compute parameters, and call the backend.
//!
//! Decode failures are not errors at this level: an upload that cannot be
//! read as an image resolves to `None`, is logged, and the caller supplies a
//! fallback. The `plan_*` functions expose the computed parameters without
//! running anything.

use super::backend::{Dimensions, EncodedImage, ImageBackend};
use super::calculations::{calculate_resize_dimensions, calculate_square_crop};
use super::data_url;
use super::loader::ImageLoader;
use super::params::{PlaceholderParams, Quality, ResizeParams, Sharpening, ThumbnailParams};
use tracing::{debug, warn};

/// Configuration for the bounded full-size image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeConfig {
    /// Longest allowed edge in pixels.
    pub max_edge: u32,
    pub quality: Quality,
    /// Enlarge sources smaller than `max_edge` instead of keeping their size.
    pub allow_upscale: bool,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            max_edge: 1200,
            quality: Quality::new(85),
            allow_upscale: false,
        }
    }
}

/// Configuration for square thumbnails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailConfig {
    pub edge: u32,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            edge: 300,
            quality: Quality::new(80),
            sharpening: Some(Sharpening::light()),
        }
    }
}

/// Configuration for blur placeholders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceholderConfig {
    pub edge: u32,
    pub quality: Quality,
    pub blur_sigma: f32,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            edge: 20,
            quality: Quality::new(10),
            blur_sigma: 2.0,
        }
    }
}

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, data: &[u8]) -> Option<Dimensions> {
    match backend.identify(data) {
        Ok(dims) => Some(dims),
        Err(e) => {
            warn!(error = %e, "Could not read image dimensions");
            None
        }
    }
}

/// Plan a resize without executing it.
pub fn plan_resize(source: Dimensions, config: &ResizeConfig) -> ResizeParams {
    let (width, height) = calculate_resize_dimensions(
        (source.width, source.height),
        config.max_edge,
        config.allow_upscale,
    );
    ResizeParams {
        width,
        height,
        quality: config.quality,
    }
}

/// Resize an image so its longer edge fits within `config.max_edge`.
///
/// Returns `None` when the source cannot be decoded or encoded.
pub fn resize(
    backend: &impl ImageBackend,
    data: &[u8],
    config: &ResizeConfig,
) -> Option<EncodedImage> {
    let dims = get_dimensions(backend, data)?;
    let params = plan_resize(dims, config);
    debug!(
        from_width = dims.width,
        from_height = dims.height,
        to_width = params.width,
        to_height = params.height,
        "Resizing image"
    );

    match backend.resize(data, &params) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!(error = %e, "Resize failed");
            None
        }
    }
}

/// Plan a thumbnail without executing it.
pub fn plan_thumbnail(source: Dimensions, config: &ThumbnailConfig) -> ThumbnailParams {
    ThumbnailParams {
        crop: calculate_square_crop((source.width, source.height)),
        edge: config.edge,
        quality: config.quality,
        sharpening: config.sharpening,
    }
}

/// Create a square `edge x edge` thumbnail from the center of the image.
///
/// Returns `None` when the source cannot be decoded or encoded.
pub fn thumbnail(
    backend: &impl ImageBackend,
    data: &[u8],
    config: &ThumbnailConfig,
) -> Option<EncodedImage> {
    let dims = get_dimensions(backend, data)?;
    let params = plan_thumbnail(dims, config);

    match backend.thumbnail(data, &params) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!(error = %e, "Thumbnail failed");
            None
        }
    }
}

/// Produce a blur placeholder data URI for an already-available image URL.
///
/// Never fails: an unreachable, unreadable or undecodable source yields
/// `None` and the caller shows its generic placeholder icon instead.
pub fn blur_placeholder(
    backend: &impl ImageBackend,
    loader: &impl ImageLoader,
    image_url: &str,
    config: &PlaceholderConfig,
) -> Option<String> {
    let data = match loader.load(image_url) {
        Ok(data) => data,
        Err(e) => {
            debug!(error = %e, "Placeholder source unavailable");
            return None;
        }
    };

    let params = PlaceholderParams {
        edge: config.edge,
        blur_sigma: config.blur_sigma,
        quality: config.quality,
    };
    match backend.placeholder(&data, &params) {
        Ok(image) if !image.bytes.is_empty() => Some(image.to_data_url()),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "Placeholder generation failed");
            None
        }
    }
}

/// Encode raw image bytes as a data URI for inline storage.
pub fn to_data_url(bytes: &[u8], mime_type: &str) -> String {
    data_url::to_data_url(bytes, mime_type)
}
