//! # Domain Value Objects
//!
//! Immutable value types for the Block Sync engine.

use serde::{Deserialize, Serialize};

use super::errors::{FetchError, SyncError};
use super::invariants::{BIG_THRESHOLD, MIN_STRIDE};

/// Parity classification of a block result.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum BlockType {
    /// Odd result value.
    Odd,
    /// Even result value.
    Even,
}

impl BlockType {
    /// Classify a result value by parity.
    pub fn from_value(value: u64) -> Self {
        if value % 2 == 1 {
            BlockType::Odd
        } else {
            BlockType::Even
        }
    }
}

/// Size classification of a block result.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum SizeType {
    /// Result value at or above [`BIG_THRESHOLD`].
    Big,
    /// Result value below [`BIG_THRESHOLD`].
    Small,
}

impl SizeType {
    /// Classify a result value against [`BIG_THRESHOLD`].
    pub fn from_value(value: u64) -> Self {
        if value >= BIG_THRESHOLD {
            SizeType::Big
        } else {
            SizeType::Small
        }
    }
}

/// Which classification a bead plate is drawn on.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationAxis {
    /// ODD / EVEN.
    #[default]
    Parity,
    /// BIG / SMALL.
    Size,
}

/// A classification value on either axis.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    /// Parity axis, odd.
    Odd,
    /// Parity axis, even.
    Even,
    /// Size axis, big.
    Big,
    /// Size axis, small.
    Small,
}

impl Classification {
    /// Short display symbol used by text renderings.
    pub fn symbol(self) -> char {
        match self {
            Classification::Odd => 'O',
            Classification::Even => 'E',
            Classification::Big => 'B',
            Classification::Small => 'S',
        }
    }
}

impl From<BlockType> for Classification {
    fn from(value: BlockType) -> Self {
        match value {
            BlockType::Odd => Classification::Odd,
            BlockType::Even => Classification::Even,
        }
    }
}

impl From<SizeType> for Classification {
    fn from(value: SizeType) -> Self {
        match value {
            SizeType::Big => Classification::Big,
            SizeType::Small => Classification::Small,
        }
    }
}

/// Stride/anchor rule selecting which heights are shown.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SamplingRule {
    /// Stable unique identifier.
    pub id: String,
    /// Display name.
    pub label: String,
    /// Sampling interval in block heights (>= 1).
    pub stride: u64,
    /// 0 aligns to absolute multiples of `stride`; otherwise the offset origin.
    pub anchor_height: u64,
}

impl SamplingRule {
    /// Create a validated rule.
    ///
    /// # Errors
    /// - `InvalidRule` if `stride < 1`
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        stride: u64,
        anchor_height: u64,
    ) -> Result<Self, SyncError> {
        let rule = Self {
            id: id.into(),
            label: label.into(),
            stride,
            anchor_height,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Create a user-defined rule with a generated id.
    pub fn custom(
        label: impl Into<String>,
        stride: u64,
        anchor_height: u64,
    ) -> Result<Self, SyncError> {
        Self::new(uuid::Uuid::new_v4().to_string(), label, stride, anchor_height)
    }

    /// Check the stride invariant. Deserialized rules bypass [`SamplingRule::new`].
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.stride < MIN_STRIDE {
            return Err(SyncError::InvalidRule(format!(
                "rule '{}' has stride {}, must be >= {}",
                self.id, self.stride, MIN_STRIDE
            )));
        }
        Ok(())
    }

    /// Whether the rule keeps every block.
    pub fn is_every_block(&self) -> bool {
        self.stride <= 1
    }
}

/// One cell of a bead plate.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GridCell {
    /// Classification on the active axis, `None` for an empty cell.
    #[serde(rename = "type")]
    pub kind: Option<Classification>,
    /// Result value of the originating block.
    pub value: Option<u64>,
}

impl GridCell {
    /// An empty cell.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A populated cell.
    pub fn filled(kind: Classification, value: u64) -> Self {
        Self {
            kind: Some(kind),
            value: Some(value),
        }
    }

    /// Whether no block occupies this cell.
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
    }
}

/// Per-axis counters shown next to a bead plate.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ClassificationTally {
    /// Odd (parity) or Big (size) count.
    pub first: usize,
    /// Even (parity) or Small (size) count.
    pub second: usize,
}

impl ClassificationTally {
    /// Total blocks counted.
    pub fn total(&self) -> usize {
        self.first + self.second
    }
}

/// Result of a store merge.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// Records added.
    pub inserted: usize,
    /// Incoming records whose height was already present.
    pub duplicates: usize,
    /// Lowest records dropped to stay within capacity.
    pub evicted: usize,
}

/// A height that could not be fetched in a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedHeight {
    /// Height that was skipped.
    pub height: u64,
    /// Why.
    pub reason: FetchError,
}

impl SkippedHeight {
    /// Convert to the non-fatal error kind for logging.
    pub fn into_error(self) -> SyncError {
        SyncError::BlockFetchFailed {
            height: self.height,
            reason: self.reason,
        }
    }
}

/// Report of a backfill run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackfillReport {
    /// Chain head height observed.
    pub head: u64,
    /// Candidate heights, descending.
    pub targets: Vec<u64>,
    /// Number of records fetched.
    pub fetched: usize,
    /// Heights that failed.
    pub skipped: Vec<SkippedHeight>,
    /// Store merge result.
    pub merge: MergeOutcome,
}

/// Report of a poller tick that fetched heights.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GapReport {
    /// Chain head height observed.
    pub head: u64,
    /// First height of the new gap, `None` if only retries ran.
    pub gap_from: Option<u64>,
    /// Number of records fetched.
    pub fetched: usize,
    /// Heights that failed this tick.
    pub skipped: Vec<SkippedHeight>,
    /// Previously failed heights attempted again.
    pub retried: Vec<u64>,
    /// Heights given up on this tick.
    pub abandoned: Vec<u64>,
    /// Store merge result.
    pub merge: MergeOutcome,
}

/// Why a tick did nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Another tick is in flight.
    Busy,
    /// The consumer surface is not observable.
    Hidden,
}

/// Outcome of one poller tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick did not run.
    Skipped(SkipReason),
    /// Head is not beyond the store and nothing needed retrying.
    UpToDate {
        /// Observed head height.
        head: u64,
    },
    /// Heights were fetched and merged.
    Synced(GapReport),
}

/// Status indicator derived from [`SyncStatus`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum StatusLabel {
    /// Last attempt failed; waiting for a retry.
    Unauthorized,
    /// Fetching a gap or a backfill window.
    Syncing,
    /// Idle and healthy.
    Listening,
}

/// Snapshot of service state for status displays.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SyncStatus {
    /// A backfill is running.
    pub backfilling: bool,
    /// A poller tick is fetching a gap.
    pub syncing: bool,
    /// Message of the last head failure, cleared by a successful backfill.
    pub last_error: Option<String>,
    /// Records in the store.
    pub store_len: usize,
    /// Highest height in the store.
    pub max_height: u64,
}

impl SyncStatus {
    /// Indicator for status displays.
    pub fn label(&self) -> StatusLabel {
        if self.last_error.is_some() {
            StatusLabel::Unauthorized
        } else if self.backfilling || self.syncing {
            StatusLabel::Syncing
        } else {
            StatusLabel::Listening
        }
    }
}
