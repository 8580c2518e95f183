//! # Domain Invariants
//!
//! Rules that must hold for the store and the rule book after every mutation.

use super::entities::BlockRecord;
use super::errors::SyncError;

/// Smallest legal sampling stride.
pub const MIN_STRIDE: u64 = 1;

/// Result values at or above this are `BIG`.
pub const BIG_THRESHOLD: u64 = 5;

/// Default store capacity (CAP).
pub const DEFAULT_STORE_CAPACITY: usize = 2000;

/// Default number of aligned heights requested by a backfill.
pub const DEFAULT_BACKFILL_TARGET: usize = 30;

/// Sampled views smaller than this trigger a backfill on rule activation.
pub const DEFAULT_MIN_VISIBLE_BLOCKS: usize = 15;

/// Default bead plate row count.
pub const DEFAULT_GRID_ROWS: usize = 6;

/// Default poller period.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

/// Invariant: snapshot order is strictly descending by height (implies no duplicates).
pub fn invariant_strictly_descending(blocks: &[BlockRecord]) -> Result<(), SyncError> {
    for pair in blocks.windows(2) {
        if pair[0].height <= pair[1].height {
            return Err(SyncError::StoreInvariant(format!(
                "order broken: {} before {}",
                pair[0].height, pair[1].height
            )));
        }
    }
    Ok(())
}

/// Invariant: the store never holds more than its capacity.
pub fn invariant_within_capacity(len: usize, capacity: usize) -> Result<(), SyncError> {
    if len > capacity {
        return Err(SyncError::StoreInvariant(format!(
            "holds {} records, capacity {}",
            len, capacity
        )));
    }
    Ok(())
}

/// Invariant: a rule book always keeps at least one rule.
pub fn invariant_rule_book_non_empty(rule_count: usize) -> Result<(), SyncError> {
    if rule_count == 0 {
        return Err(SyncError::InvalidRule(
            "at least one rule must remain".to_string(),
        ));
    }
    Ok(())
}
