//! The remote tabular collection contract.
//!
//! A collection is a named table on the hosted backend (characters, shop
//! items, wheel rewards, ...). It supports range queries ordered by primary
//! key ascending that also report the exact total row count, keyed row
//! mutations, and a change feed. Network failures surface as
//! [`RemoteError`]; consumers treat them as recoverable and log-only.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

/// Primary key of a remote row.
pub type RowId = i64;

/// A row stored in a remote collection.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> RowId;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),
    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("row {0} not found")]
    NotFound(RowId),
    #[error("row {0} already exists")]
    Conflict(RowId),
}

/// A contiguous slice of rows by position in key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub offset: u64,
    pub limit: u64,
}

impl RowRange {
    /// Rows `[(page - 1) * page_size, page * page_size)` for a 1-based page.
    pub fn for_page(page: u32, page_size: u64) -> Self {
        Self {
            offset: u64::from(page.saturating_sub(1)) * page_size,
            limit: page_size,
        }
    }
}

/// The result of a range query.
#[derive(Debug, Clone, PartialEq)]
pub struct RangePage<R> {
    pub rows: Vec<R>,
    /// Exact size of the whole collection at query time, not of this page.
    pub total_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// A change pushed by the backend's realtime feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: String,
    pub kind: ChangeKind,
    pub id: RowId,
}

#[async_trait]
pub trait RemoteCollection: Send + Sync {
    type Row: Record;

    /// Collection name, used in logs and change events.
    fn name(&self) -> &str;

    /// Fetch `range` of rows ordered by primary key ascending, plus the exact
    /// total row count.
    async fn fetch_range(&self, range: RowRange) -> Result<RangePage<Self::Row>, RemoteError>;

    async fn insert(&self, row: Self::Row) -> Result<(), RemoteError>;

    async fn update(&self, row: Self::Row) -> Result<(), RemoteError>;

    async fn delete(&self, id: RowId) -> Result<(), RemoteError>;

    /// Register for change events. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_starts_at_zero() {
        assert_eq!(
            RowRange::for_page(1, 12),
            RowRange {
                offset: 0,
                limit: 12
            }
        );
    }

    #[test]
    fn later_pages_are_contiguous() {
        assert_eq!(RowRange::for_page(3, 5).offset, 10);
        assert_eq!(RowRange::for_page(3, 5).limit, 5);
    }

    #[test]
    fn page_zero_is_treated_as_first() {
        assert_eq!(RowRange::for_page(0, 5).offset, 0);
    }
}
