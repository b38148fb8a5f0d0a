//! Paginated synchronization of remote collections.
//!
//! Every content screen (characters, shop, wheel) reveals its collection a
//! page at a time. The pieces:
//!
//! - **Collection**: [`RemoteCollection`] trait, the backend's range query +
//!   exact count contract, plus row mutations and the change feed
//! - **State**: [`PageState`], the synchronous state machine with its
//!   [`HasMorePolicy`]
//! - **Sync**: [`PagedListSync`], the async controller a screen owns
//! - **Live**: [`LiveReload`], first-page reload on change events

pub mod collection;
mod live;
pub mod state;
mod sync;

pub use collection::{
    ChangeEvent, ChangeKind, RangePage, Record, RemoteCollection, RemoteError, RowId, RowRange,
};
pub use live::LiveReload;
pub use state::{HasMorePolicy, LoadOutcome, PageState, SkipReason, SyncPhase};
pub use sync::PagedListSync;
