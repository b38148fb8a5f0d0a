//! Upload preparation: one user file in, every derived artifact out.
//!
//! An [`ImageAsset`] is what the admin upload form holds between file
//! selection and save. It owns the source bytes plus the bounded full-size
//! image, the square thumbnail and the blur placeholder, all derived from the
//! same input. Nothing here persists anything; the asset is handed to the
//! remote collection (or dropped if the form is cancelled).
//!
//! Non-image uploads are rejected *before* decoding, from the declared MIME
//! type and size alone.

use super::backend::{EncodedImage, ImageBackend};
use super::loader::LocalLoader;
use super::operations::{
    PlaceholderConfig, ResizeConfig, ThumbnailConfig, blur_placeholder, resize, thumbnail,
};
use super::params::{Quality, Sharpening};
use super::rust_backend::mime_type_for_extension;
use crate::config::AppConfig;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0} is not an accepted image type")]
    NotAnImage(String),
    #[error("file is empty")]
    Empty,
    #[error("file is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
    #[error("file could not be read as an image")]
    Undecodable,
}

/// A raw file as selected by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: Option<String>,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: Some(name.into()),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, taking its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let bytes = std::fs::read(path)?;
        let mime_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_type_for_extension)
            .unwrap_or("application/octet-stream");

        Ok(Self {
            name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
            mime_type: mime_type.to_string(),
            bytes,
        })
    }
}

/// Everything an upload needs, resolved from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub resize: ResizeConfig,
    pub thumbnail: ThumbnailConfig,
    pub placeholder: PlaceholderConfig,
    pub accepted_mime_types: Vec<String>,
    pub max_bytes: u64,
}

impl PipelineConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            resize: ResizeConfig {
                max_edge: config.images.max_edge,
                quality: Quality::new(config.images.quality),
                allow_upscale: config.images.allow_upscale,
            },
            thumbnail: ThumbnailConfig {
                edge: config.thumbnails.edge,
                quality: Quality::new(config.thumbnails.quality),
                sharpening: config.thumbnails.sharpen.then(Sharpening::light),
            },
            placeholder: PlaceholderConfig {
                edge: config.placeholder.edge,
                quality: Quality::new(config.placeholder.quality),
                blur_sigma: config.placeholder.blur_sigma,
            },
            accepted_mime_types: config.upload.accepted_mime_types.clone(),
            max_bytes: config.upload.max_bytes,
        }
    }

    fn accepts(&self, mime_type: &str) -> bool {
        self.accepted_mime_types
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(mime_type))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

/// A normalized upload, ready to hand to the persistence layer.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub source: SourceFile,
    /// First 16 hex chars of the SHA-256 of the source bytes.
    pub fingerprint: String,
    pub resized: EncodedImage,
    pub thumbnail: EncodedImage,
    /// `None` when the placeholder could not be produced; callers fall back
    /// to a static icon.
    pub placeholder: Option<String>,
}

impl ImageAsset {
    /// Validate an upload and derive all artifacts from it.
    pub fn prepare(
        source: SourceFile,
        config: &PipelineConfig,
        backend: &impl ImageBackend,
    ) -> Result<Self, UploadError> {
        check_upload(&source, config)?;

        let resized =
            resize(backend, &source.bytes, &config.resize).ok_or(UploadError::Undecodable)?;
        let thumb = thumbnail(backend, &source.bytes, &config.thumbnail)
            .ok_or(UploadError::Undecodable)?;
        let placeholder = blur_placeholder(
            backend,
            &LocalLoader,
            &resized.to_data_url(),
            &config.placeholder,
        );

        let fingerprint = fingerprint(&source.bytes);
        info!(
            name = source.name.as_deref().unwrap_or("<unnamed>"),
            %fingerprint,
            width = resized.width,
            height = resized.height,
            "Prepared image asset"
        );

        Ok(Self {
            source,
            fingerprint,
            resized,
            thumbnail: thumb,
            placeholder,
        })
    }

    /// Storage-friendly base name, stable for identical content.
    pub fn stem(&self) -> String {
        let name = self
            .source
            .name
            .as_deref()
            .and_then(|n| Path::new(n).file_stem())
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        format!("{}-{}", name, &self.fingerprint[..8])
    }

    /// Bytes saved by storing the resized image instead of the source.
    pub fn bytes_saved(&self) -> i64 {
        self.source.bytes.len() as i64 - self.resized.bytes.len() as i64
    }
}

/// Prepare many uploads in parallel; each result is independent.
pub fn prepare_batch(
    sources: Vec<SourceFile>,
    config: &PipelineConfig,
    backend: &impl ImageBackend,
) -> Vec<Result<ImageAsset, UploadError>> {
    sources
        .into_par_iter()
        .map(|source| ImageAsset::prepare(source, config, backend))
        .collect()
}

fn check_upload(source: &SourceFile, config: &PipelineConfig) -> Result<(), UploadError> {
    if !config.accepts(&source.mime_type) {
        debug!(mime_type = %source.mime_type, "Rejected non-image upload");
        return Err(UploadError::NotAnImage(source.mime_type.clone()));
    }
    if source.bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    let size = source.bytes.len() as u64;
    if size > config.max_bytes {
        return Err(UploadError::TooLarge {
            size,
            limit: config.max_bytes,
        });
    }
    Ok(())
}

fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}
