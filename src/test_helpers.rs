//! Shared test utilities.
//!
//! Synthetic image bytes for the imaging tests, and a scripted
//! [`RemoteCollection`] whose fetches can be counted, delayed, and made to
//! fail for the paging tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let collection = Arc::new(ScriptedCollection::with_rows(12).yielding());
//! let sync = PagedListSync::new(collection.clone(), &paging_config(5, HasMorePolicy::ExactCount));
//! sync.load_next().await;
//! assert_eq!(collection.fetch_count(), 1);
//! ```

use async_trait::async_trait;
use image::{ImageEncoder, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

use crate::config::PagingConfig;
use crate::paging::{
    ChangeEvent, ChangeKind, HasMorePolicy, RangePage, Record, RemoteCollection, RemoteError,
    RowId, RowRange,
};

// =========================================================================
// Image fixtures
// =========================================================================

/// A gradient JPEG of the given size.
pub fn test_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// A PNG with a transparent right half.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        let alpha = if x < width / 2 { 255 } else { 0 };
        image::Rgba([200, 40, 40, alpha])
    });
    let mut cursor = Cursor::new(Vec::new());
    image::codecs::png::PngEncoder::new(&mut cursor)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .unwrap();
    cursor.into_inner()
}

// =========================================================================
// Scripted collection
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRow {
    pub id: RowId,
    pub name: String,
}

impl TestRow {
    pub fn new(id: RowId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

impl Record for TestRow {
    fn id(&self) -> RowId {
        self.id
    }
}

/// A collection that records every range it is asked for.
///
/// With [`yielding`](Self::yielding), each fetch suspends once before
/// answering so concurrent callers observe it in flight.
pub struct ScriptedCollection {
    rows: Mutex<BTreeMap<RowId, TestRow>>,
    ranges: Mutex<Vec<RowRange>>,
    failure: Mutex<Option<RemoteError>>,
    fetches: AtomicUsize,
    yield_on_fetch: AtomicBool,
    events: broadcast::Sender<ChangeEvent>,
}

impl ScriptedCollection {
    /// Rows with ids `1..=count`.
    pub fn with_rows(count: usize) -> Self {
        let rows = (1..=count as RowId)
            .map(|id| (id, TestRow::new(id, &format!("row {id}"))))
            .collect();
        let (events, _) = broadcast::channel(16);
        Self {
            rows: Mutex::new(rows),
            ranges: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            fetches: AtomicUsize::new(0),
            yield_on_fetch: AtomicBool::new(false),
            events,
        }
    }

    pub fn yielding(self) -> Self {
        self.yield_on_fetch.store(true, Ordering::SeqCst);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn requested_ranges(&self) -> Vec<RowRange> {
        self.ranges.lock().unwrap().clone()
    }

    /// Make the next fetch fail with `error`.
    pub fn fail_next(&self, error: RemoteError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    /// Insert directly and broadcast the change, as another client would.
    pub fn insert_row(&self, row: TestRow) {
        let id = row.id;
        self.rows.lock().unwrap().insert(id, row);
        self.notify(ChangeKind::Inserted, id);
    }

    fn notify(&self, kind: ChangeKind, id: RowId) {
        let _ = self.events.send(ChangeEvent {
            collection: "scripted".into(),
            kind,
            id,
        });
    }
}

#[async_trait]
impl RemoteCollection for ScriptedCollection {
    type Row = TestRow;

    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_range(&self, range: RowRange) -> Result<RangePage<TestRow>, RemoteError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.ranges.lock().unwrap().push(range);

        if self.yield_on_fetch.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }

        if let Some(error) = self.failure.lock().unwrap().take() {
            return Err(error);
        }

        let rows = self.rows.lock().unwrap();
        Ok(RangePage {
            rows: rows
                .values()
                .skip(range.offset as usize)
                .take(range.limit as usize)
                .cloned()
                .collect(),
            total_count: rows.len() as u64,
        })
    }

    async fn insert(&self, row: TestRow) -> Result<(), RemoteError> {
        self.insert_row(row);
        Ok(())
    }

    async fn update(&self, row: TestRow) -> Result<(), RemoteError> {
        let id = row.id;
        {
            let mut rows = self.rows.lock().unwrap();
            let existing = rows.get_mut(&id).ok_or(RemoteError::NotFound(id))?;
            *existing = row;
        }
        self.notify(ChangeKind::Updated, id);
        Ok(())
    }

    async fn delete(&self, id: RowId) -> Result<(), RemoteError> {
        self.rows
            .lock()
            .unwrap()
            .remove(&id)
            .ok_or(RemoteError::NotFound(id))?;
        self.notify(ChangeKind::Deleted, id);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }
}

pub fn paging_config(page_size: u64, has_more: HasMorePolicy) -> PagingConfig {
    PagingConfig {
        page_size,
        has_more,
    }
}

/// Yield to the runtime until `condition` holds. Panics after two seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached within 2s");
}
