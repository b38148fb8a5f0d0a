//! # Companion Core
//!
//! The reusable core of the game companion app: the upload image pipeline
//! and the paginated synchronization of remote content collections.
//!
//! # Architecture: Two Independent Halves
//!
//! ```text
//! Upload      file bytes  →  ImageAsset   (resized JPEG + square thumbnail + blur placeholder)
//! Browse      collection  →  PageState    (rows revealed a page at a time, reloaded on change)
//! ```
//!
//! The image half is synchronous CPU work with no shared state; batches run
//! on rayon's pool. The paging half is async on tokio; each screen owns its
//! own [`paging::PagedListSync`] and nothing is shared between screens.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Resize, square thumbnail, blur placeholder, data URIs; upload validation |
//! | [`paging`] | `RemoteCollection` contract, page state machine, `PagedListSync`, live reload |
//! | [`store`] | `InMemoryCollection`, an in-process `RemoteCollection` seeded from JSON |
//! | [`catalog`] | Game content rows (characters, shop items, coin packages, wheel, coupons) |
//! | [`config`] | `config.toml` loading, merging over stock defaults, and validation |
//! | [`output`] | CLI output formatting for the `companion` binary |
//!
//! # Design Decisions
//!
//! ## Failures Are Values, Not Crashes
//!
//! A photo that cannot be decoded, a placeholder source that cannot be
//! loaded, and a page fetch that times out are all expected in normal use.
//! Imaging operations resolve to `None` and log; page fetches record the
//! error in the state and leave the loaded rows alone. The caller decides
//! whether to fall back or retry.
//!
//! ## Exact Totals Decide `has_more`
//!
//! The backend reports the exact collection size with every page, so the
//! default [`paging::HasMorePolicy::ExactCount`] stops as soon as every row
//! is loaded. The older "page came back full" heuristic is still available
//! and costs one empty fetch when the size is a multiple of the page size.
//!
//! ## Never Enlarge By Default
//!
//! Resizing bounds the longer edge and keeps small sources at their own
//! size. `images.allow_upscale = true` stretches them up to the bound
//! instead.

pub mod catalog;
pub mod config;
pub mod imaging;
pub mod output;
pub mod paging;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
