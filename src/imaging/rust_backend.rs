//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary; no system image library
//! is required.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP) | `image::load_from_memory` (format sniffed from bytes) |
//! | Identify | `ImageReader::into_dimensions` (header only, no full decode) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Thumbnail crop | `DynamicImage::crop_imm` + `resize_exact` |
//! | Sharpening | `DynamicImage::unsharpen` |
//! | Placeholder | `resize_exact` (`Triangle`) + `DynamicImage::blur` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, Dimensions, EncodedImage, ImageBackend};
use super::params::{PlaceholderParams, Quality, ResizeParams, ThumbnailParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::sync::LazyLock;

/// MIME types whose decoders are compiled in.
const MIME_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("image/jpeg", ImageFormat::Jpeg),
    ("image/jpg", ImageFormat::Jpeg),
    ("image/png", ImageFormat::Png),
    ("image/gif", ImageFormat::Gif),
    ("image/webp", ImageFormat::WebP),
];

static SUPPORTED_MIME_TYPES: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    MIME_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(mime, _)| *mime)
        .collect()
});

/// Returns the MIME types that have working decoders compiled in.
pub fn supported_input_mime_types() -> &'static [&'static str] {
    &SUPPORTED_MIME_TYPES
}

/// Guess a MIME type from a file extension, for inputs that arrive without one.
pub fn mime_type_for_extension(ext: &str) -> Option<&'static str> {
    let format = ImageFormat::from_extension(ext)?;
    MIME_CANDIDATES
        .iter()
        .find(|(_, fmt)| *fmt == format)
        .map(|(mime, _)| *mime)
}

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(data: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(data).map_err(|e| BackendError::Decode(e.to_string()))
}

fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<EncodedImage, BackendError> {
    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.value())
        .encode_image(&rgb)
        .map_err(|e| BackendError::Encode(e.to_string()))?;

    Ok(EncodedImage {
        bytes,
        width: rgb.width(),
        height: rgb.height(),
        mime_type: "image/jpeg",
    })
}

fn require_positive(name: &str, value: u32) -> Result<(), BackendError> {
    if value == 0 {
        return Err(BackendError::InvalidParams(format!("{name} must be > 0")));
    }
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, data: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, data: &[u8], params: &ResizeParams) -> Result<EncodedImage, BackendError> {
        require_positive("width", params.width)?;
        require_positive("height", params.height)?;

        let img = decode(data)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        encode_jpeg(&resized, params.quality)
    }

    fn thumbnail(
        &self,
        data: &[u8],
        params: &ThumbnailParams,
    ) -> Result<EncodedImage, BackendError> {
        require_positive("edge", params.edge)?;
        require_positive("crop size", params.crop.size)?;

        let img = decode(data)?;
        let crop = params.crop;
        if crop.x + crop.size > img.width() || crop.y + crop.size > img.height() {
            return Err(BackendError::InvalidParams(format!(
                "crop {}x{}+{}+{} exceeds {}x{} source",
                crop.size,
                crop.size,
                crop.x,
                crop.y,
                img.width(),
                img.height()
            )));
        }

        let square = img
            .crop_imm(crop.x, crop.y, crop.size, crop.size)
            .resize_exact(params.edge, params.edge, FilterType::Lanczos3);

        let final_img = match params.sharpening {
            Some(sharpening) => square.unsharpen(sharpening.sigma, sharpening.threshold),
            None => square,
        };

        encode_jpeg(&final_img, params.quality)
    }

    fn placeholder(
        &self,
        data: &[u8],
        params: &PlaceholderParams,
    ) -> Result<EncodedImage, BackendError> {
        require_positive("edge", params.edge)?;

        let img = decode(data)?;
        // Blur after the downscale: the surface is a few hundred pixels, so the
        // filter cost is negligible regardless of the source size.
        let tiny = img
            .resize_exact(params.edge, params.edge, FilterType::Triangle)
            .blur(params.blur_sigma);
        encode_jpeg(&tiny, params.quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::CropRegion;
    use crate::imaging::params::Sharpening;
    use crate::test_helpers::{png_bytes, test_jpeg_bytes};

    #[test]
    fn supported_mime_types_match_decodable_formats() {
        let mimes = supported_input_mime_types();
        for expected in &["image/jpeg", "image/png", "image/gif", "image/webp"] {
            assert!(mimes.contains(expected), "expected {expected} in supported types");
        }
    }

    #[test]
    fn mime_type_from_extension() {
        assert_eq!(mime_type_for_extension("JPG"), Some("image/jpeg"));
        assert_eq!(mime_type_for_extension("png"), Some("image/png"));
        assert_eq!(mime_type_for_extension("txt"), None);
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let dims = RustBackend::new()
            .identify(&test_jpeg_bytes(200, 150))
            .unwrap();
        assert_eq!(
            dims,
            Dimensions {
                width: 200,
                height: 150
            }
        );
    }

    #[test]
    fn identify_garbage_errors() {
        let result = RustBackend::new().identify(b"definitely not an image");
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn resize_produces_requested_jpeg() {
        let out = RustBackend::new()
            .resize(
                &test_jpeg_bytes(400, 300),
                &ResizeParams {
                    width: 200,
                    height: 150,
                    quality: Quality::new(80),
                },
            )
            .unwrap();

        assert_eq!((out.width, out.height), (200, 150));
        assert_eq!(out.mime_type, "image/jpeg");
        // Encoded output decodes back to the same geometry
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 150));
    }

    #[test]
    fn resize_flattens_png_alpha() {
        let out = RustBackend::new()
            .resize(
                &png_bytes(64, 64),
                &ResizeParams {
                    width: 32,
                    height: 32,
                    quality: Quality::default(),
                },
            )
            .unwrap();
        assert_eq!(image::guess_format(&out.bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn resize_zero_width_is_rejected() {
        let result = RustBackend::new().resize(
            &test_jpeg_bytes(10, 10),
            &ResizeParams {
                width: 0,
                height: 10,
                quality: Quality::default(),
            },
        );
        assert!(matches!(result, Err(BackendError::InvalidParams(_))));
    }

    #[test]
    fn thumbnail_exact_square_dimensions() {
        let out = RustBackend::new()
            .thumbnail(
                &test_jpeg_bytes(800, 600),
                &ThumbnailParams {
                    crop: CropRegion {
                        x: 100,
                        y: 0,
                        size: 600,
                    },
                    edge: 128,
                    quality: Quality::new(80),
                    sharpening: Some(Sharpening::light()),
                },
            )
            .unwrap();

        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (128, 128));
    }

    #[test]
    fn thumbnail_crop_outside_source_errors() {
        let result = RustBackend::new().thumbnail(
            &test_jpeg_bytes(100, 100),
            &ThumbnailParams {
                crop: CropRegion {
                    x: 50,
                    y: 0,
                    size: 100,
                },
                edge: 32,
                quality: Quality::default(),
                sharpening: None,
            },
        );
        assert!(matches!(result, Err(BackendError::InvalidParams(_))));
    }

    #[test]
    fn placeholder_is_tiny_and_small() {
        let out = RustBackend::new()
            .placeholder(
                &test_jpeg_bytes(1200, 900),
                &PlaceholderParams {
                    edge: 20,
                    blur_sigma: 2.0,
                    quality: Quality::new(10),
                },
            )
            .unwrap();

        assert_eq!((out.width, out.height), (20, 20));
        assert!(out.bytes.len() < 1024, "placeholder is {} bytes", out.bytes.len());
    }
}
