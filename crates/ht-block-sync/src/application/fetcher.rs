//! # Batch Fetcher
//!
//! Fetches a list of heights from a [`ChainSource`], keeping successes and
//! recording failures instead of aborting.

use futures::stream::{self, StreamExt};
use std::time::Duration;

use crate::domain::{BlockRecord, FetchError, SkippedHeight};
use crate::ports::ChainSource;

/// Successes and failures of one batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchBatch {
    /// Records fetched, in completion order.
    pub fetched: Vec<BlockRecord>,
    /// Heights that failed, ascending.
    pub skipped: Vec<SkippedHeight>,
}

impl FetchBatch {
    /// Heights that failed.
    pub fn skipped_heights(&self) -> Vec<u64> {
        self.skipped.iter().map(|s| s.height).collect()
    }
}

/// Fetch `heights`, at most `concurrency` requests in flight, each bounded by
/// `timeout`.
pub async fn fetch_batch<S>(
    source: &S,
    heights: &[u64],
    concurrency: usize,
    timeout: Duration,
) -> FetchBatch
where
    S: ChainSource + ?Sized,
{
    let results: Vec<(u64, Result<BlockRecord, FetchError>)> = stream::iter(heights.iter().copied())
        .map(|height| async move { (height, fetch_one(source, height, timeout).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut batch = FetchBatch::default();
    for (height, result) in results {
        match result {
            Ok(block) => batch.fetched.push(block),
            Err(reason) => {
                tracing::warn!(
                    height,
                    source = source.source_id(),
                    "[ht-sync] Skipping height: {}",
                    reason
                );
                batch.skipped.push(SkippedHeight { height, reason });
            }
        }
    }
    batch.skipped.sort_by_key(|s| s.height);
    batch
}

/// Fetch a single height under `timeout`.
async fn fetch_one<S>(source: &S, height: u64, timeout: Duration) -> Result<BlockRecord, FetchError>
where
    S: ChainSource + ?Sized,
{
    match tokio::time::timeout(timeout, source.get_block(height)).await {
        Ok(Ok(block)) if block.height == height => Ok(block),
        Ok(Ok(block)) => Err(FetchError::Transport(format!(
            "source returned height {} for {}",
            block.height, height
        ))),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(FetchError::Timeout {
            after_ms: timeout.as_millis() as u64,
        }),
    }
}
