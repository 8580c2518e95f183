//! # Block Sync Service
//!
//! Application service owning the block store and driving backfills and
//! poller ticks against a [`ChainSource`].

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::fetcher::fetch_batch;
use super::stats::SyncStats;
use crate::algorithms::{backfill_targets, build_bead_grid, gap_range, sample_view, GridColumn};
use crate::config::SyncConfig;
use crate::domain::{
    BackfillReport, BlockRecord, BlockStore, ClassificationAxis, FetchError, GapReport,
    SamplingRule, SkipReason, SyncError, SyncStatus, TickOutcome,
};
use crate::ports::{AlwaysVisible, BlockSyncApi, ChainSource, SurfaceVisibility};

/// Holds the busy flag for one tick and releases it on drop.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn try_claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Counts an in-flight activity for status reporting.
struct ActivityGuard<'a> {
    count: &'a AtomicUsize,
}

impl<'a> ActivityGuard<'a> {
    fn enter(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::AcqRel);
        Self { count }
    }
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Block Sync Service - keeps a bounded window of recent blocks in sync.
pub struct BlockSyncService<S: ChainSource> {
    /// Configuration.
    config: SyncConfig,
    /// Chain data source.
    source: Arc<S>,
    /// Synced blocks.
    store: BlockStore,
    /// Consumer surface visibility.
    visibility: Arc<dyn SurfaceVisibility>,
    /// Poller tick in flight.
    busy: AtomicBool,
    /// Backfills in flight.
    backfilling: AtomicUsize,
    /// Gap fetches in flight.
    syncing: AtomicUsize,
    /// Last head failure, cleared by a successful backfill.
    last_error: RwLock<Option<String>>,
    /// Failed gap heights -> failed attempts.
    gap_ledger: Mutex<BTreeMap<u64, u32>>,
    /// Counters.
    stats: Arc<SyncStats>,
}

impl<S: ChainSource> BlockSyncService<S> {
    /// Create a service with an empty store.
    ///
    /// # Errors
    /// - `InvalidConfig` if `config` does not validate
    pub fn new(config: SyncConfig, source: Arc<S>) -> Result<Self, SyncError> {
        config.validate()?;
        Ok(Self {
            store: BlockStore::new(config.store_capacity),
            config,
            source,
            visibility: Arc::new(AlwaysVisible),
            busy: AtomicBool::new(false),
            backfilling: AtomicUsize::new(0),
            syncing: AtomicUsize::new(0),
            last_error: RwLock::new(None),
            gap_ledger: Mutex::new(BTreeMap::new()),
            stats: Arc::new(SyncStats::default()),
        })
    }

    /// Replace the visibility port.
    pub fn with_visibility(mut self, visibility: Arc<dyn SurfaceVisibility>) -> Self {
        self.visibility = visibility;
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Chain source in use.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Underlying store.
    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    /// Shared counters.
    pub fn stats(&self) -> Arc<SyncStats> {
        Arc::clone(&self.stats)
    }

    /// Gap heights awaiting retry, ascending.
    pub fn pending_retries(&self) -> Vec<u64> {
        self.gap_ledger.lock().keys().copied().collect()
    }

    /// Internal: fetch the head, recording a failure as the last error.
    async fn fetch_head(&self) -> Result<BlockRecord, SyncError> {
        let timeout = self.config.fetch_timeout();
        let result = match tokio::time::timeout(timeout, self.source.get_head()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                after_ms: self.config.fetch_timeout_ms,
            }),
        };

        result.map_err(|e| {
            tracing::warn!(
                source = self.source.source_id(),
                "[ht-sync] Chain head unavailable: {}",
                e
            );
            self.stats.record_head_failure();
            let error = SyncError::HeadUnavailable(e);
            *self.last_error.write() = Some(error.to_string());
            error
        })
    }

    /// Internal: drop ledger heights that no longer need a retry.
    fn prune_ledger(&self, ledger: &mut BTreeMap<u64, u32>) {
        let floor = if self.store.is_full() {
            self.store.min_height()
        } else {
            None
        };
        ledger.retain(|height, _| {
            !self.store.contains(*height) && floor.map_or(true, |floor| *height >= floor)
        });
    }
}

#[async_trait]
impl<S: ChainSource + 'static> BlockSyncApi for BlockSyncService<S> {
    async fn backfill(
        &self,
        rule: &SamplingRule,
        target_count: usize,
    ) -> Result<BackfillReport, SyncError> {
        rule.validate()?;
        let _active = ActivityGuard::enter(&self.backfilling);

        let head = self.fetch_head().await?;
        let targets = backfill_targets(head.height, rule, target_count);
        self.stats.record_backfill();

        let batch = fetch_batch(
            self.source.as_ref(),
            &targets,
            self.config.fetch_concurrency,
            self.config.fetch_timeout(),
        )
        .await;
        let fetched = batch.fetched.len();
        self.stats.record_batch(fetched, batch.skipped.len());

        let merge = self.store.merge(batch.fetched);
        *self.last_error.write() = None;

        tracing::info!(
            head = head.height,
            stride = rule.stride,
            fetched,
            skipped = batch.skipped.len(),
            "[ht-sync] Backfill complete for rule {}",
            rule.id
        );

        Ok(BackfillReport {
            head: head.height,
            targets,
            fetched,
            skipped: batch.skipped,
            merge,
        })
    }

    async fn ensure_coverage(
        &self,
        rule: &SamplingRule,
    ) -> Result<Option<BackfillReport>, SyncError> {
        let visible = self.sampled_view(rule).len();
        if visible >= self.config.min_visible_blocks {
            tracing::debug!(visible, "[ht-sync] Rule {} already covered", rule.id);
            return Ok(None);
        }
        self.backfill(rule, self.config.backfill_target).await.map(Some)
    }

    async fn poll_tick(&self) -> Result<TickOutcome, SyncError> {
        if !self.visibility.is_observable() {
            self.stats.record_skip();
            return Ok(TickOutcome::Skipped(SkipReason::Hidden));
        }
        let Some(_busy) = BusyGuard::try_claim(&self.busy) else {
            self.stats.record_skip();
            tracing::trace!("[ht-sync] Tick already in flight, skipping");
            return Ok(TickOutcome::Skipped(SkipReason::Busy));
        };
        self.stats.record_tick();

        let head = self.fetch_head().await?;
        let gap = gap_range(
            self.store.max_height(),
            head.height,
            self.store.capacity(),
        );

        let retried: Vec<u64> = {
            let mut ledger = self.gap_ledger.lock();
            self.prune_ledger(&mut ledger);
            ledger
                .keys()
                .copied()
                .filter(|height| gap.as_ref().map_or(true, |gap| !gap.contains(height)))
                .collect()
        };

        if gap.is_none() && retried.is_empty() {
            return Ok(TickOutcome::UpToDate { head: head.height });
        }

        let _syncing = ActivityGuard::enter(&self.syncing);
        let gap_from = gap.as_ref().map(|gap| *gap.start());
        let mut heights = retried.clone();
        heights.extend(gap.into_iter().flatten());

        let batch = fetch_batch(
            self.source.as_ref(),
            &heights,
            self.config.fetch_concurrency,
            self.config.fetch_timeout(),
        )
        .await;
        let fetched = batch.fetched.len();
        self.stats.record_batch(fetched, batch.skipped.len());

        let fetched_heights: Vec<u64> = batch.fetched.iter().map(|b| b.height).collect();
        let merge = self.store.merge(batch.fetched);

        let mut abandoned = Vec::new();
        {
            let mut ledger = self.gap_ledger.lock();
            for height in fetched_heights {
                ledger.remove(&height);
            }
            // Heights above the store maximum come back as gap on the next tick.
            let max_height = self.store.max_height();
            ledger.retain(|height, _| *height < max_height);
            for skipped in batch.skipped.iter().filter(|s| s.height < max_height) {
                let attempts = ledger.entry(skipped.height).or_insert(0);
                *attempts += 1;
                if *attempts >= self.config.max_gap_retries {
                    ledger.remove(&skipped.height);
                    abandoned.push(skipped.height);
                }
            }
            self.prune_ledger(&mut ledger);
        }

        if !abandoned.is_empty() {
            self.stats.record_abandoned(abandoned.len());
            tracing::warn!(
                count = abandoned.len(),
                "[ht-sync] Giving up on gap heights {:?}",
                abandoned
            );
        }

        tracing::debug!(
            head = head.height,
            fetched,
            skipped = batch.skipped.len(),
            "[ht-sync] Tick synced"
        );

        Ok(TickOutcome::Synced(GapReport {
            head: head.height,
            gap_from,
            fetched,
            skipped: batch.skipped,
            retried,
            abandoned,
            merge,
        }))
    }

    fn snapshot(&self) -> Vec<BlockRecord> {
        self.store.snapshot()
    }

    fn sampled_view(&self, rule: &SamplingRule) -> Vec<BlockRecord> {
        sample_view(&self.store.snapshot(), rule)
    }

    fn bead_plate(
        &self,
        rule: &SamplingRule,
        axis: ClassificationAxis,
        rows: usize,
    ) -> Result<Vec<GridColumn>, SyncError> {
        let mut ascending = self.sampled_view(rule);
        ascending.reverse();
        build_bead_grid(&ascending, axis, rows)
    }

    fn status(&self) -> SyncStatus {
        SyncStatus {
            backfilling: self.backfilling.load(Ordering::Acquire) > 0,
            syncing: self.syncing.load(Ordering::Acquire) > 0,
            last_error: self.last_error.read().clone(),
            store_len: self.store.len(),
            max_height: self.store.max_height(),
        }
    }

    fn reset(&self) {
        self.store.clear();
        self.gap_ledger.lock().clear();
        *self.last_error.write() = None;
        tracing::info!("[ht-sync] Sync state reset");
    }
}
