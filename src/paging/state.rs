//! Per-screen page state and its transitions.
//!
//! [`PageState`] is a plain value: every transition is a synchronous method,
//! so the state machine is tested here without any runtime. The async
//! controller in [`sync`](super::sync) only wraps these calls around the
//! remote fetch.
//!
//! ```text
//!   Idle ──load_next──▶ Loading ──ok──▶ Loaded ──load_next──▶ Loading ...
//!                          │
//!                          └──err──▶ Failed ──load_next──▶ Loading ...
//! ```
//!
//! A fetch is identified by a [`FetchTicket`]. Completing a ticket whose
//! generation no longer matches (after `reset` or a newer `begin_reload`)
//! changes nothing.

use super::collection::{RangePage, RemoteError};
use serde::{Deserialize, Serialize};

/// How "more rows may exist" is decided after a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HasMorePolicy {
    /// More pages exist iff the last page came back full. Reports one extra
    /// (empty) page when the collection size is a multiple of the page size.
    PageFull,
    /// More rows exist iff fewer rows are loaded than the reported total.
    #[default]
    ExactCount,
}

impl HasMorePolicy {
    pub fn has_more(self, returned: usize, page_size: u64, loaded: usize, total: u64) -> bool {
        match self {
            HasMorePolicy::PageFull => returned as u64 == page_size,
            HasMorePolicy::ExactCount => (loaded as u64) < total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Whether a fetched page extends or replaces the local rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Append,
    Replace,
}

/// An issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub page: u32,
    pub mode: FetchMode,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch has not resolved yet.
    InFlight,
    /// The collection is known to be fully loaded.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { page: u32, fetched: usize },
    Failed(RemoteError),
    Skipped(SkipReason),
    /// The result arrived after the state was reset or reloaded.
    Discarded,
}

/// Local mirror of a remote collection's leading rows.
#[derive(Debug, Clone)]
pub struct PageState<R> {
    /// Rows in page order.
    pub rows: Vec<R>,
    /// Last successfully fetched page (1-based); 0 before the first fetch.
    pub page: u32,
    /// Total reported by the most recent successful fetch.
    pub total_count: Option<u64>,
    pub has_more: bool,
    pub phase: SyncPhase,
    pub last_error: Option<String>,
    in_flight: bool,
    generation: u64,
}

impl<R> Default for PageState<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            page: 0,
            total_count: None,
            has_more: true,
            phase: SyncPhase::Idle,
            last_error: None,
            in_flight: false,
            generation: 0,
        }
    }
}

impl<R> PageState<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Start fetching the page after the last loaded one.
    pub fn try_begin_next(&mut self) -> Result<FetchTicket, SkipReason> {
        if self.in_flight {
            return Err(SkipReason::InFlight);
        }
        if !self.has_more {
            return Err(SkipReason::Exhausted);
        }
        self.in_flight = true;
        self.phase = SyncPhase::Loading;
        Ok(FetchTicket {
            page: self.page + 1,
            mode: FetchMode::Append,
            generation: self.generation,
        })
    }

    /// Start re-fetching the first page. Supersedes any fetch in flight.
    pub fn begin_reload(&mut self) -> FetchTicket {
        self.generation += 1;
        self.in_flight = true;
        self.phase = SyncPhase::Loading;
        FetchTicket {
            page: 1,
            mode: FetchMode::Replace,
            generation: self.generation,
        }
    }

    /// Drop all rows and metadata; in-flight results will be discarded.
    pub fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::default()
        };
    }

    /// Apply the result of the fetch identified by `ticket`.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<RangePage<R>, RemoteError>,
        page_size: u64,
        policy: HasMorePolicy,
    ) -> LoadOutcome {
        if ticket.generation != self.generation {
            return LoadOutcome::Discarded;
        }
        self.in_flight = false;

        match result {
            Ok(RangePage { rows, total_count }) => {
                let fetched = rows.len();
                match ticket.mode {
                    FetchMode::Append => self.rows.extend(rows),
                    FetchMode::Replace => self.rows = rows,
                }
                self.page = ticket.page;
                self.total_count = Some(total_count);
                self.has_more = policy.has_more(fetched, page_size, self.rows.len(), total_count);
                self.phase = SyncPhase::Loaded;
                self.last_error = None;
                LoadOutcome::Loaded {
                    page: ticket.page,
                    fetched,
                }
            }
            Err(e) => {
                // Rows and has_more stay as they were so the user can retry
                self.phase = SyncPhase::Failed;
                self.last_error = Some(e.to_string());
                LoadOutcome::Failed(e)
            }
        }
    }
}
