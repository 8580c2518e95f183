//! # Block Sync Configuration
//!
//! Configuration for the Block Sync service and its poller.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::{
    SyncError, DEFAULT_BACKFILL_TARGET, DEFAULT_GRID_ROWS, DEFAULT_MIN_VISIBLE_BLOCKS,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_STORE_CAPACITY,
};

/// Block sync configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum records kept in the store.
    pub store_capacity: usize,

    /// Poller period in milliseconds.
    pub poll_interval_ms: u64,

    /// Heights requested per backfill.
    pub backfill_target: usize,

    /// Sampled views smaller than this trigger a backfill on rule activation.
    pub min_visible_blocks: usize,

    /// Bead plate rows.
    pub grid_rows: usize,

    /// Block fetches in flight at once within one batch.
    pub fetch_concurrency: usize,

    /// Per-request timeout in milliseconds.
    pub fetch_timeout_ms: u64,

    /// Failed attempts before a gap height is abandoned.
    pub max_gap_retries: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            store_capacity: DEFAULT_STORE_CAPACITY,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            backfill_target: DEFAULT_BACKFILL_TARGET,
            min_visible_blocks: DEFAULT_MIN_VISIBLE_BLOCKS,
            grid_rows: DEFAULT_GRID_ROWS,
            fetch_concurrency: 1,
            fetch_timeout_ms: 10_000,
            max_gap_retries: 5,
        }
    }
}

impl SyncConfig {
    /// Create a config for testing (smaller values).
    pub fn for_testing() -> Self {
        Self {
            store_capacity: 2000,
            poll_interval_ms: 20,
            backfill_target: 5,
            min_visible_blocks: 3,
            grid_rows: 6,
            fetch_concurrency: 1,
            fetch_timeout_ms: 1_000,
            max_gap_retries: 3,
        }
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.store_capacity == 0 {
            return Err(SyncError::InvalidConfig(
                "store_capacity must be >= 1".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(SyncError::InvalidConfig(
                "poll_interval_ms must be >= 1".to_string(),
            ));
        }
        if self.grid_rows == 0 {
            return Err(SyncError::InvalidConfig("grid_rows must be >= 1".to_string()));
        }
        if self.fetch_concurrency == 0 {
            return Err(SyncError::InvalidConfig(
                "fetch_concurrency must be >= 1".to_string(),
            ));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(SyncError::InvalidConfig(
                "fetch_timeout_ms must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Poller period.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Per-request timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
