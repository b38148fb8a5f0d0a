//! Image normalization for uploads. Pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Resize → JPEG** | Lanczos3, longer edge bounded, never enlarged by default |
//! | **Thumbnail** | center square crop + Lanczos3 + `unsharpen` |
//! | **Blur placeholder** | 20px square + Gaussian blur, quality 10, as a data URI |
//! | **Data URI** | `base64` standard engine |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Loader**: [`ImageLoader`] trait resolving a URL to bytes
//! - **Operations**: High-level functions combining calculations + backend
//! - **Asset**: [`ImageAsset`], the validated upload with all derived forms

pub mod asset;
pub mod backend;
mod calculations;
pub mod data_url;
pub mod loader;
pub mod operations;
mod params;
pub mod rust_backend;

pub use asset::{ImageAsset, PipelineConfig, SourceFile, UploadError, prepare_batch};
pub use backend::{BackendError, Dimensions, EncodedImage, ImageBackend};
pub use calculations::{CropRegion, calculate_resize_dimensions, calculate_square_crop};
pub use loader::{ImageLoader, LoadError, LocalLoader};
pub use operations::{
    PlaceholderConfig, ResizeConfig, ThumbnailConfig, blur_placeholder, resize, thumbnail,
    to_data_url,
};
pub use params::{PlaceholderParams, Quality, ResizeParams, Sharpening, ThumbnailParams};
pub use rust_backend::{RustBackend, mime_type_for_extension, supported_input_mime_types};
