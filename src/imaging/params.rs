//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides the output geometry) and the [`backend`](super::backend)
//! (which does the actual pixel work). Swapping the backend for a mock in
//! tests never changes the operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 85). Clamped on construction.
//! - [`Sharpening`]: Unsharp-mask parameters (sigma + threshold) for thumbnail crispness.
//! - [`ResizeParams`]: Target dimensions and quality for a bounded resize.
//! - [`ThumbnailParams`]: Square crop region, output edge, quality, optional sharpening.
//! - [`PlaceholderParams`]: Tiny square edge, blur sigma and quality for a blur placeholder.

use super::calculations::CropRegion;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    /// Build from a `0.0..=1.0` quality factor, the way upload forms express it.
    ///
    /// Out-of-range and non-finite inputs are clamped into range.
    pub fn from_fraction(factor: f32) -> Self {
        let factor = if factor.is_finite() { factor } else { 1.0 };
        Self::new((factor.clamp(0.0, 1.0) * 100.0).round() as u32)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: Minimum brightness difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Light sharpening suitable for thumbnails.
    pub fn light() -> Self {
        Self {
            sigma: 0.5,
            threshold: 0,
        }
    }
}

/// Parameters for a bounded resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

/// Parameters for a square thumbnail (center crop + scale).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailParams {
    /// Region of the source to keep.
    pub crop: CropRegion,
    /// Output edge; the result is always `edge x edge`.
    pub edge: u32,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
}

/// Parameters for a blur placeholder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceholderParams {
    pub edge: u32,
    pub blur_sigma: f32,
    pub quality: Quality,
}
