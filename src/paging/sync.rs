//! The per-screen paginated list controller.
//!
//! [`PagedListSync`] owns one [`PageState`] and drives it against a
//! [`RemoteCollection`]. The state lock is only held for the synchronous
//! transitions, never across the fetch itself, so a second `load_next`
//! issued while a fetch is outstanding sees the in-flight flag and returns
//! [`LoadOutcome::Skipped`] without touching the network.

use super::collection::{RemoteCollection, RowRange};
use super::state::{FetchTicket, HasMorePolicy, LoadOutcome, PageState, SyncPhase};
use crate::config::PagingConfig;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error};

pub struct PagedListSync<C: RemoteCollection> {
    collection: Arc<C>,
    page_size: u64,
    policy: HasMorePolicy,
    state: Mutex<PageState<C::Row>>,
}

impl<C: RemoteCollection> PagedListSync<C> {
    pub fn new(collection: Arc<C>, config: &PagingConfig) -> Self {
        Self {
            collection,
            page_size: config.page_size.max(1),
            policy: config.has_more,
            state: Mutex::new(PageState::new()),
        }
    }

    pub fn collection(&self) -> &Arc<C> {
        &self.collection
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Fetch the next page and append it.
    ///
    /// No-op while another fetch is in flight or once the collection is
    /// known to be exhausted. Errors are logged and reported in the outcome;
    /// the loaded rows are left untouched.
    pub async fn load_next(&self) -> LoadOutcome {
        let begun = {
            let mut state = self.lock();
            state.try_begin_next()
        };
        match begun {
            Ok(ticket) => self.run(ticket).await,
            Err(reason) => {
                debug!(collection = self.collection.name(), ?reason, "Skipping load");
                LoadOutcome::Skipped(reason)
            }
        }
    }

    /// Re-fetch the first page and replace the local rows with it.
    ///
    /// Rows stay visible until the new page arrives. Any fetch still in
    /// flight is superseded and its result dropped.
    pub async fn reload(&self) -> LoadOutcome {
        let ticket = {
            let mut state = self.lock();
            state.begin_reload()
        };
        self.run(ticket).await
    }

    /// Forget everything loaded so far, e.g. after a filter change.
    pub fn invalidate(&self) {
        debug!(collection = self.collection.name(), "Invalidating page cache");
        self.lock().reset();
    }

    async fn run(&self, ticket: FetchTicket) -> LoadOutcome {
        let range = RowRange::for_page(ticket.page, self.page_size);
        let result = self.collection.fetch_range(range).await;

        if let Err(e) = &result {
            error!(
                collection = self.collection.name(),
                page = ticket.page,
                error = %e,
                "Page fetch failed"
            );
        }

        let outcome = {
            let mut state = self.lock();
            state.complete(ticket, result, self.page_size, self.policy)
        };
        match &outcome {
            LoadOutcome::Loaded { page, fetched } => debug!(
                collection = self.collection.name(),
                page,
                fetched,
                "Page loaded"
            ),
            LoadOutcome::Discarded => debug!(
                collection = self.collection.name(),
                page = ticket.page,
                "Discarding superseded page"
            ),
            _ => {}
        }
        outcome
    }

    pub fn rows(&self) -> Vec<C::Row> {
        self.lock().rows.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().rows.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.lock().has_more
    }

    pub fn total_count(&self) -> Option<u64> {
        self.lock().total_count
    }

    pub fn page(&self) -> u32 {
        self.lock().page
    }

    pub fn phase(&self) -> SyncPhase {
        self.lock().phase
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// A consistent copy of the whole state.
    pub fn snapshot(&self) -> PageState<C::Row> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, PageState<C::Row>> {
        // State is only mutated through complete transitions
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
