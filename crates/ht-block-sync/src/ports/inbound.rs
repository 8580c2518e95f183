//! # Inbound Ports
//!
//! API trait defining what the Block Sync engine offers to rendering and
//! configuration collaborators.

use async_trait::async_trait;

use crate::algorithms::GridColumn;
use crate::domain::{
    BackfillReport, BlockRecord, ClassificationAxis, SamplingRule, SyncError, SyncStatus,
    TickOutcome,
};

/// Block Sync API - inbound port.
#[async_trait]
pub trait BlockSyncApi: Send + Sync {
    /// Populate the store with up to `target_count` heights aligned to `rule`.
    ///
    /// Only a chain head failure is returned as an error; per-height failures
    /// are listed in the report.
    async fn backfill(
        &self,
        rule: &SamplingRule,
        target_count: usize,
    ) -> Result<BackfillReport, SyncError>;

    /// Backfill `rule` when its sampled view is below the visibility threshold.
    async fn ensure_coverage(
        &self,
        rule: &SamplingRule,
    ) -> Result<Option<BackfillReport>, SyncError>;

    /// Run one poller tick.
    async fn poll_tick(&self) -> Result<TickOutcome, SyncError>;

    /// All stored records, descending by height.
    fn snapshot(&self) -> Vec<BlockRecord>;

    /// Stored records aligned to `rule`, descending by height.
    fn sampled_view(&self, rule: &SamplingRule) -> Vec<BlockRecord>;

    /// Bead plate of the sampled view for `rule`, oldest block first.
    fn bead_plate(
        &self,
        rule: &SamplingRule,
        axis: ClassificationAxis,
        rows: usize,
    ) -> Result<Vec<GridColumn>, SyncError>;

    /// Current status flags and last error.
    fn status(&self) -> SyncStatus;

    /// Drop all synced state (credential change).
    fn reset(&self);
}
