//! # Domain Errors
//!
//! Error types for the Block Sync engine.
//!
//! Only [`SyncError::HeadUnavailable`] ever leaves a backfill or poll
//! operation. Per-height failures are absorbed and reported in the
//! operation's report instead.

use thiserror::Error;

/// Failure reported by a chain source for a single request.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The source has no block at this height.
    #[error("Block not found at height {height}")]
    NotFound {
        /// Requested height
        height: u64,
    },

    /// The credential was rejected by the source.
    #[error("Unauthorized: credential rejected")]
    Unauthorized,

    /// Transport-level failure (connection, decoding, rate limiting).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {after_ms}ms")]
    Timeout {
        /// Timeout that elapsed, in milliseconds
        after_ms: u64,
    },
}

/// Block sync error types.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    /// Chain head could not be fetched. Fatal to the current attempt, retryable.
    #[error("Chain head unavailable: {0}")]
    HeadUnavailable(FetchError),

    /// A single height could not be fetched. Never fatal.
    #[error("Block fetch failed at height {height}: {reason}")]
    BlockFetchFailed {
        /// Height that was skipped
        height: u64,
        /// Underlying fetch failure
        reason: FetchError,
    },

    /// Rule rejected (stride < 1, or deleting the only rule).
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// No rule with this id.
    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    /// Configuration or argument out of range.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Store order or capacity broken.
    #[error("Store invariant violated: {0}")]
    StoreInvariant(String),
}

impl SyncError {
    /// Whether retrying the same operation later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::HeadUnavailable(_) | SyncError::BlockFetchFailed { .. }
        )
    }
}
