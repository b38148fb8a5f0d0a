//! Resolving an image URL to bytes for placeholder generation.
//!
//! Blur placeholders are derived from an image that is already available by
//! URL, not from the raw upload. [`LocalLoader`] handles the URLs this crate
//! produces or can reach without a network client: `data:` URIs, `file://`
//! URLs and bare filesystem paths. Anything else fails with
//! [`LoadError::UnsupportedScheme`], which callers treat exactly like a
//! cross-origin refusal: no placeholder, fall back to the static icon.

use super::data_url::{DataUrlError, parse_data_url};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid data URL: {0}")]
    DataUrl(#[from] DataUrlError),
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// Resolves an image URL to its encoded bytes.
pub trait ImageLoader: Sync {
    fn load(&self, url: &str) -> Result<Vec<u8>, LoadError>;
}

/// Loader for in-process and filesystem URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalLoader;

impl ImageLoader for LocalLoader {
    fn load(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        if url.starts_with("data:") {
            return Ok(parse_data_url(url)?.bytes);
        }
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(std::fs::read(Path::new(path))?);
        }
        match url.split_once("://") {
            Some((scheme, _)) => Err(LoadError::UnsupportedScheme(scheme.to_string())),
            None => Ok(std::fs::read(Path::new(url))?),
        }
    }
}
