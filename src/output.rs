//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Each entity (an upload, a catalog row) leads with its positional index and
//! its identity: the file name for uploads, the title for rows. Sizes, output
//! files, and status are shown as indented context lines underneath.
//!
//! # Output Format
//!
//! ## Prepare
//!
//! ```text
//! 001 hero.jpg (2.1 MB)
//!     Resized: 1200x900, 183.4 KB → hero-1a2b3c4d.jpg
//!     Thumbnail: 300x300, 21.0 KB → hero-1a2b3c4d-thumb.jpg
//!     Placeholder: 612 bytes
//! 002 notes.txt
//!     Skipped: text/plain is not an accepted image type
//!
//! Prepared 1 of 2 files, saved 1.9 MB
//! ```
//!
//! ## Browse
//!
//! ```text
//! shop_items: page 1, 5 of 12
//! 001 Sword
//!     200 coins (-50%, 2h left), 2 left
//! 002 Shield
//!     10 coins, sold out
//! ```
//!
//! # Architecture
//!
//! Each command has `format_*` functions (returning `Vec<String>`) for
//! testability and the binary prints them. Format functions are pure.

use chrono::{DateTime, Utc};

use crate::catalog::Listing;
use crate::imaging::{ImageAsset, UploadError};
use crate::paging::{PageState, SyncPhase};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count using binary units.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} bytes");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

// ============================================================================
// Prepare
// ============================================================================

/// Where the CLI wrote a prepared asset's derived files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    pub resized: String,
    pub thumbnail: String,
}

pub fn format_prepared(index: usize, asset: &ImageAsset, written: &WrittenFiles) -> Vec<String> {
    let name = asset.source.name.as_deref().unwrap_or("(unnamed)");
    let mut lines = vec![format!(
        "{} {} ({})",
        format_index(index),
        name,
        format_size(asset.source.bytes.len() as u64)
    )];

    lines.push(format!(
        "{}Resized: {}x{}, {} \u{2192} {}",
        indent(1),
        asset.resized.width,
        asset.resized.height,
        format_size(asset.resized.bytes.len() as u64),
        written.resized
    ));
    lines.push(format!(
        "{}Thumbnail: {}x{}, {} \u{2192} {}",
        indent(1),
        asset.thumbnail.width,
        asset.thumbnail.height,
        format_size(asset.thumbnail.bytes.len() as u64),
        written.thumbnail
    ));
    lines.push(match &asset.placeholder {
        Some(uri) => format!("{}Placeholder: {} bytes", indent(1), uri.len()),
        None => format!("{}Placeholder: unavailable", indent(1)),
    });
    lines
}

pub fn format_rejected(index: usize, name: &str, error: &UploadError) -> Vec<String> {
    vec![
        format!("{} {}", format_index(index), name),
        format!("{}Skipped: {}", indent(1), error),
    ]
}

pub fn format_prepare_summary(prepared: usize, total: usize, bytes_saved: i64) -> String {
    let saved = if bytes_saved >= 0 {
        format!("saved {}", format_size(bytes_saved as u64))
    } else {
        format!("grew by {}", format_size(bytes_saved.unsigned_abs()))
    };
    format!("Prepared {prepared} of {total} files, {saved}")
}

// ============================================================================
// Placeholder
// ============================================================================

pub fn format_placeholder(url: &str, placeholder: Option<&str>) -> Vec<String> {
    match placeholder {
        Some(uri) => vec![uri.to_string()],
        None => vec![format!(
            "No placeholder for {url}; falling back to the static icon"
        )],
    }
}

// ============================================================================
// Browse
// ============================================================================

/// Format rows `from..` of a paged list, numbered by overall position.
///
/// Pass the row count from before the latest load as `from` to show just the
/// page that arrived.
pub fn format_page<R: Listing>(
    collection: &str,
    state: &PageState<R>,
    from: usize,
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut lines = Vec::new();

    let total = state
        .total_count
        .map_or_else(|| "?".to_string(), |t| t.to_string());
    let mut header = format!(
        "{}: page {}, {} of {}",
        collection,
        state.page,
        state.rows.len(),
        total
    );
    if state.phase == SyncPhase::Failed {
        let error = state.last_error.as_deref().unwrap_or("unknown error");
        header.push_str(&format!(" (last fetch failed: {error})"));
    }
    lines.push(header);

    for (offset, row) in state.rows.iter().enumerate().skip(from) {
        lines.push(format!("{} {}", format_index(offset + 1), row.title()));
        lines.push(format!("{}{}", indent(1), row.detail(now)));
    }

    if !state.has_more {
        lines.push("(end of list)".to_string());
    }
    lines
}
