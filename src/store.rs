//! In-process implementation of [`RemoteCollection`].
//!
//! Rows live in a `BTreeMap` keyed by primary key, so range queries come
//! back in key order for free. Every mutation is published on a broadcast
//! channel the same way the hosted backend pushes realtime changes. The CLI
//! seeds one from a JSON array; tests use it as a faithful stand-in.

use crate::paging::{
    ChangeEvent, ChangeKind, RangePage, Record, RemoteCollection, RemoteError, RowId, RowRange,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio::sync::broadcast;

/// Change feed buffer; slow subscribers beyond this observe a lag.
const EVENT_CAPACITY: usize = 256;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate row id {0}")]
    DuplicateId(RowId),
}

pub struct InMemoryCollection<R> {
    name: String,
    rows: RwLock<BTreeMap<RowId, R>>,
    events: broadcast::Sender<ChangeEvent>,
}

impl<R: Record> InMemoryCollection<R> {
    pub fn new(name: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            name: name.into(),
            rows: RwLock::new(BTreeMap::new()),
            events,
        }
    }

    /// Build a collection from rows; ids must be unique.
    pub fn with_rows(
        name: impl Into<String>,
        rows: impl IntoIterator<Item = R>,
    ) -> Result<Self, SeedError> {
        let collection = Self::new(name);
        {
            let mut map = collection.write();
            for row in rows {
                let id = row.id();
                if map.insert(id, row).is_some() {
                    return Err(SeedError::DuplicateId(id));
                }
            }
        }
        Ok(collection)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<RowId, R>> {
        self.rows.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<RowId, R>> {
        self.rows.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, kind: ChangeKind, id: RowId) {
        // Only fails when nobody is subscribed
        let _ = self.events.send(ChangeEvent {
            collection: self.name.clone(),
            kind,
            id,
        });
    }
}

impl<R: Record + DeserializeOwned> InMemoryCollection<R> {
    /// Seed from a file holding a JSON array of rows.
    pub fn from_json_file(name: impl Into<String>, path: &Path) -> Result<Self, SeedError> {
        let content = std::fs::read_to_string(path)?;
        let rows: Vec<R> = serde_json::from_str(&content)?;
        Self::with_rows(name, rows)
    }
}

#[async_trait]
impl<R: Record> RemoteCollection for InMemoryCollection<R> {
    type Row = R;

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_range(&self, range: RowRange) -> Result<RangePage<R>, RemoteError> {
        let map = self.read();
        let offset = usize::try_from(range.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(range.limit).unwrap_or(usize::MAX);
        let rows = map.values().skip(offset).take(limit).cloned().collect();

        Ok(RangePage {
            rows,
            total_count: map.len() as u64,
        })
    }

    async fn insert(&self, row: R) -> Result<(), RemoteError> {
        let id = row.id();
        {
            let mut map = self.write();
            if map.contains_key(&id) {
                return Err(RemoteError::Conflict(id));
            }
            map.insert(id, row);
        }
        self.publish(ChangeKind::Inserted, id);
        Ok(())
    }

    async fn update(&self, row: R) -> Result<(), RemoteError> {
        let id = row.id();
        {
            let mut map = self.write();
            match map.get_mut(&id) {
                Some(existing) => *existing = row,
                None => return Err(RemoteError::NotFound(id)),
            }
        }
        self.publish(ChangeKind::Updated, id);
        Ok(())
    }

    async fn delete(&self, id: RowId) -> Result<(), RemoteError> {
        if self.write().remove(&id).is_none() {
            return Err(RemoteError::NotFound(id));
        }
        self.publish(ChangeKind::Deleted, id);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }
}
