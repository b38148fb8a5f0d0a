//! Application configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Every component
//! receives its settings from an explicit [`AppConfig`] passed at construction
//! time; nothing reads configuration from ambient global state.
//!
//! Stock defaults are serialized to a TOML value and the user's file is merged
//! on top, so a config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [images]
//! max_edge = 1200           # Longest edge of the stored full-size image
//! quality = 85              # JPEG quality (1-100)
//! allow_upscale = false     # Enlarge images smaller than max_edge
//!
//! [thumbnails]
//! edge = 300                # Square thumbnail edge
//! quality = 80
//! sharpen = true            # Light unsharp mask after downscaling
//!
//! [placeholder]
//! edge = 20                 # Blur placeholder edge
//! quality = 10
//! blur_sigma = 2.0
//!
//! [upload]
//! accepted_mime_types = ["image/jpeg", "image/png", "image/gif", "image/webp"]
//! max_bytes = 10485760      # 10 MiB
//!
//! [paging]
//! page_size = 12            # Rows per fetched page
//! has_more = "exact_count"  # or "page_full"
//!
//! [processing]
//! max_workers = 4           # Parallel upload workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::paging::HasMorePolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Full-size image normalization.
    pub images: ImagesConfig,
    /// Square thumbnail settings.
    pub thumbnails: ThumbnailsConfig,
    /// Blur placeholder settings.
    pub placeholder: PlaceholderSettings,
    /// Upload acceptance rules.
    pub upload: UploadConfig,
    /// Remote list pagination.
    pub paging: PagingConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, quality) in [
            ("images.quality", self.images.quality),
            ("thumbnails.quality", self.thumbnails.quality),
            ("placeholder.quality", self.placeholder.quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(ConfigError::Validation(format!("{key} must be 1-100")));
            }
        }
        if self.images.max_edge == 0 {
            return Err(ConfigError::Validation(
                "images.max_edge must be non-zero".into(),
            ));
        }
        if self.thumbnails.edge == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.edge must be non-zero".into(),
            ));
        }
        if !(1..=64).contains(&self.placeholder.edge) {
            return Err(ConfigError::Validation(
                "placeholder.edge must be 1-64".into(),
            ));
        }
        if !self.placeholder.blur_sigma.is_finite() || self.placeholder.blur_sigma < 0.0 {
            return Err(ConfigError::Validation(
                "placeholder.blur_sigma must be a non-negative number".into(),
            ));
        }
        if self.upload.accepted_mime_types.is_empty() {
            return Err(ConfigError::Validation(
                "upload.accepted_mime_types must not be empty".into(),
            ));
        }
        if let Some(bad) = self
            .upload
            .accepted_mime_types
            .iter()
            .find(|m| !m.starts_with("image/"))
        {
            return Err(ConfigError::Validation(format!(
                "upload.accepted_mime_types: {bad} is not an image type"
            )));
        }
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "upload.max_bytes must be non-zero".into(),
            ));
        }
        if self.paging.page_size == 0 {
            return Err(ConfigError::Validation(
                "paging.page_size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Full-size image settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Longest allowed edge in pixels.
    pub max_edge: u32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Enlarge images whose longer edge is below `max_edge`.
    pub allow_upscale: bool,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_edge: 1200,
            quality: 85,
            allow_upscale: false,
        }
    }
}

/// Square thumbnail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Output edge in pixels; thumbnails are always square.
    pub edge: u32,
    pub quality: u32,
    /// Apply a light unsharp mask after downscaling.
    pub sharpen: bool,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            edge: 300,
            quality: 80,
            sharpen: true,
        }
    }
}

/// Blur placeholder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholderSettings {
    pub edge: u32,
    pub quality: u32,
    /// Gaussian blur standard deviation, applied at placeholder size.
    pub blur_sigma: f32,
}

impl Default for PlaceholderSettings {
    fn default() -> Self {
        Self {
            edge: 20,
            quality: 10,
            blur_sigma: 2.0,
        }
    }
}

/// Upload acceptance rules, checked before any decoding happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    pub accepted_mime_types: Vec<String>,
    pub max_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            accepted_mime_types: ["image/jpeg", "image/png", "image/gif", "image/webp"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Remote list pagination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagingConfig {
    pub page_size: u64,
    pub has_more: HasMorePolicy,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: 12,
            has_more: HasMorePolicy::default(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel upload workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_workers: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_workers
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, or stock defaults when `path` is `None`
/// or does not exist.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = match path {
        Some(p) => load_raw_config(p)?,
        None => None,
    };
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Companion Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Full-size images
# ---------------------------------------------------------------------------
[images]
# Longest edge (pixels) of the stored image. Larger uploads are scaled down.
max_edge = 1200

# JPEG encoding quality (1 = worst, 100 = best).
quality = 85

# Enlarge uploads smaller than max_edge. Off by default: enlarging only adds
# bytes and softness.
allow_upscale = false

# ---------------------------------------------------------------------------
# Thumbnails (always square, center-cropped)
# ---------------------------------------------------------------------------
[thumbnails]
edge = 300
quality = 80
sharpen = true

# ---------------------------------------------------------------------------
# Blur placeholders (inline data URIs shown while the full image loads)
# ---------------------------------------------------------------------------
[placeholder]
edge = 20
quality = 10
blur_sigma = 2.0

# ---------------------------------------------------------------------------
# Upload acceptance
# ---------------------------------------------------------------------------
[upload]
accepted_mime_types = ["image/jpeg", "image/png", "image/gif", "image/webp"]
max_bytes = 10485760

# ---------------------------------------------------------------------------
# Remote list pagination
# ---------------------------------------------------------------------------
[paging]
# Rows per fetched page.
page_size = 12

# How "more pages available" is decided:
#   "exact_count" - compare loaded rows with the collection's total count
#   "page_full"   - assume more when the last page came back full (reports
#                   one empty extra page when the total is a multiple of
#                   page_size)
has_more = "exact_count"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel upload workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_workers = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_image_settings() {
        let config = AppConfig::default();
        assert_eq!(config.images.max_edge, 1200);
        assert_eq!(config.images.quality, 85);
        assert!(!config.images.allow_upscale);
        assert_eq!(config.thumbnails.edge, 300);
        assert_eq!(config.placeholder.edge, 20);
        assert_eq!(config.placeholder.quality, 10);
    }

    #[test]
    fn default_config_has_paging_settings() {
        let config = AppConfig::default();
        assert_eq!(config.paging.page_size, 12);
        assert_eq!(config.paging.has_more, HasMorePolicy::ExactCount);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[images]
max_edge = 800
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        // Overridden value
        assert_eq!(config.images.max_edge, 800);
        // Default values preserved
        assert_eq!(config.images.quality, 85);
        assert_eq!(config.thumbnails.edge, 300);
    }

    #[test]
    fn parse_has_more_policy() {
        let toml = r#"
[paging]
page_size = 5
has_more = "page_full"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.paging.page_size, 5);
        assert_eq!(config.paging.has_more, HasMorePolicy::PageFull);
    }

    #[test]
    fn unknown_policy_rejected() {
        let toml = r#"
[paging]
has_more = "guess"
"#;
        assert!(toml::from_str::<AppConfig>(toml).is_err());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_without_path_is_default() {
        let config = load_config(None).unwrap();
        assert_eq!(config.images.max_edge, 1200);
    }

    #[test]
    fn load_config_missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(Some(&tmp.path().join("config.toml"))).unwrap();
        assert_eq!(config.paging.page_size, 12);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[thumbnails]
edge = 128
sharpen = false

[upload]
max_bytes = 2048
"#,
        )
        .unwrap();

        let config = load_config(Some(&config_path)).unwrap();
        assert_eq!(config.thumbnails.edge, 128);
        assert!(!config.thumbnails.sharpen);
        assert_eq!(config.upload.max_bytes, 2048);
        // Unspecified values should be defaults
        assert_eq!(config.thumbnails.quality, 80);
        assert_eq!(config.upload.accepted_mime_types.len(), 4);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        fs::write(&config_path, "this is not valid toml [[[").unwrap();

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        fs::write(&config_path, "[paging]\npage_size = 0\n").unwrap();

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // Processing tests
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_workers: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_workers: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_zero_means_one() {
        let config = ProcessingConfig {
            max_workers: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"quality = 90"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"quality = 70"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("quality").unwrap().as_integer(), Some(70));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[images]
max_edge = 1200
quality = 85
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[images]
quality = 70
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let images = merged.get("images").unwrap();
        assert_eq!(images.get("quality").unwrap().as_integer(), Some(70));
        assert_eq!(images.get("max_edge").unwrap().as_integer(), Some(1200));
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base: toml::Value =
            toml::from_str(r#"accepted = ["image/jpeg", "image/png"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"accepted = ["image/webp"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("accepted").unwrap().as_array().unwrap().len(), 1);
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[images]
max_egde = 900
"#;
        let result: Result<AppConfig, _> = toml::from_str(toml_str);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let toml_str = r#"
[theme]
dark = true
"#;
        let result: Result<AppConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_quality_bounds() {
        let mut config = AppConfig::default();
        config.thumbnails.quality = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.images.quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_placeholder_edge() {
        let mut config = AppConfig::default();
        config.placeholder.edge = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_image_mime() {
        let mut config = AppConfig::default();
        config.upload.accepted_mime_types.push("application/pdf".into());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("application/pdf"));
    }

    #[test]
    fn validate_rejects_negative_sigma() {
        let mut config = AppConfig::default();
        config.placeholder.blur_sigma = -1.0;
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Stock config tests
    // =========================================================================

    #[test]
    fn stock_config_toml_is_valid_toml() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        assert!(value.is_table());
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: AppConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(config.images.max_edge, defaults.images.max_edge);
        assert_eq!(config.thumbnails.edge, defaults.thumbnails.edge);
        assert_eq!(config.placeholder.blur_sigma, defaults.placeholder.blur_sigma);
        assert_eq!(config.upload.max_bytes, defaults.upload.max_bytes);
        assert_eq!(config.paging.has_more, defaults.paging.has_more);
        assert_eq!(config.processing.max_workers, None);
    }

    #[test]
    fn stock_defaults_value_is_table() {
        assert!(stock_defaults_value().is_table());
    }
}
