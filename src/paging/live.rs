//! Realtime reload: re-fetch the first page whenever the collection changes.

use super::collection::RemoteCollection;
use super::sync::PagedListSync;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A running change subscription for one [`PagedListSync`].
///
/// Teardown is explicit: call [`unsubscribe`](Self::unsubscribe) when the
/// screen goes away. Dropping the handle detaches the task, which keeps
/// reloading until the collection's change feed closes.
#[must_use = "call unsubscribe() on teardown"]
pub struct LiveReload {
    task: JoinHandle<()>,
}

impl LiveReload {
    /// Stop reacting to change events.
    pub fn unsubscribe(self) {
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl<C> PagedListSync<C>
where
    C: RemoteCollection + 'static,
{
    /// Subscribe to the collection's change feed; each event triggers a
    /// first-page [`reload`](Self::reload).
    ///
    /// Must be called from within a tokio runtime.
    pub fn watch(self: &Arc<Self>) -> LiveReload {
        let mut receiver = self.collection().subscribe();
        let sync = Arc::clone(self);

        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        debug!(
                            collection = %event.collection,
                            id = event.id,
                            kind = ?event.kind,
                            "Change received, reloading first page"
                        );
                        sync.reload().await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Missed events collapse into a single reload
                        warn!(skipped = n, "Change feed lagged");
                        sync.reload().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Change feed closed, live reload stopping");
                        break;
                    }
                }
            }
        });

        LiveReload { task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paging::HasMorePolicy;
    use crate::test_helpers::{ScriptedCollection, TestRow, paging_config, wait_until};

    #[tokio::test]
    async fn change_event_reloads_first_page() {
        let collection = Arc::new(ScriptedCollection::with_rows(3));
        let sync = Arc::new(PagedListSync::new(
            collection.clone(),
            &paging_config(5, HasMorePolicy::ExactCount),
        ));
        sync.load_next().await;
        assert_eq!(sync.len(), 3);

        let live = sync.watch();
        collection.insert_row(TestRow::new(4, "late arrival"));

        wait_until(|| sync.len() == 4).await;
        assert_eq!(sync.total_count(), Some(4));
        assert_eq!(collection.fetch_count(), 2);
        live.unsubscribe();
    }

    #[tokio::test]
    async fn unsubscribe_stops_reloading() {
        let collection = Arc::new(ScriptedCollection::with_rows(2));
        let sync = Arc::new(PagedListSync::new(
            collection.clone(),
            &paging_config(5, HasMorePolicy::ExactCount),
        ));
        sync.load_next().await;

        let live = sync.watch();
        assert!(live.is_active());
        live.unsubscribe();

        collection.insert_row(TestRow::new(3, "unseen"));
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(sync.len(), 2);
        assert_eq!(collection.fetch_count(), 1);
    }
}
