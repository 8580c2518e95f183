//! # Sync Statistics
//!
//! Lock-free counters updated by the sync service.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Sync counters.
#[derive(Debug, Default)]
pub struct SyncStats {
    /// Poller ticks that ran.
    pub ticks_run: AtomicU64,
    /// Poller ticks skipped (busy or hidden).
    pub ticks_skipped: AtomicU64,
    /// Records fetched by backfills and ticks.
    pub blocks_fetched: AtomicU64,
    /// Per-height fetch failures.
    pub fetch_failures: AtomicU64,
    /// Chain head failures.
    pub head_failures: AtomicU64,
    /// Backfills that reached the fetch stage.
    pub backfills: AtomicU64,
    /// Gap heights given up on.
    pub heights_abandoned: AtomicU64,
}

/// Point-in-time copy of [`SyncStats`].
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncStatsSnapshot {
    /// Poller ticks that ran.
    pub ticks_run: u64,
    /// Poller ticks skipped.
    pub ticks_skipped: u64,
    /// Records fetched.
    pub blocks_fetched: u64,
    /// Per-height fetch failures.
    pub fetch_failures: u64,
    /// Chain head failures.
    pub head_failures: u64,
    /// Backfills run.
    pub backfills: u64,
    /// Gap heights given up on.
    pub heights_abandoned: u64,
}

impl SyncStats {
    /// Record a tick that did not run.
    pub fn record_skip(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a tick that ran.
    pub fn record_tick(&self) {
        self.ticks_run.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished fetch batch.
    pub fn record_batch(&self, fetched: usize, failed: usize) {
        self.blocks_fetched
            .fetch_add(fetched as u64, Ordering::Relaxed);
        self.fetch_failures
            .fetch_add(failed as u64, Ordering::Relaxed);
    }

    /// Record a chain head failure.
    pub fn record_head_failure(&self) {
        self.head_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a backfill.
    pub fn record_backfill(&self) {
        self.backfills.fetch_add(1, Ordering::Relaxed);
    }

    /// Record abandoned gap heights.
    pub fn record_abandoned(&self, count: usize) {
        self.heights_abandoned
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Copy the current values.
    pub fn snapshot(&self) -> SyncStatsSnapshot {
        SyncStatsSnapshot {
            ticks_run: self.ticks_run.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            blocks_fetched: self.blocks_fetched.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            head_failures: self.head_failures.load(Ordering::Relaxed),
            backfills: self.backfills.load(Ordering::Relaxed),
            heights_abandoned: self.heights_abandoned.load(Ordering::Relaxed),
        }
    }
}
