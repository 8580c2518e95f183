//! # Sync Flow Tests
//!
//! Backfill and poller flows through `BlockSyncApi`, against the mock chain
//! and a scripted chain whose heights fail a set number of times.
//!
//! ## Flows Tested:
//!
//! 1. **Backfill**: rule-aligned targets below the head, partial failures
//! 2. **Poll**: gap fetch, bounded gap window, retry of failed heights
//! 3. **Errors**: head failures keep synced data and set the last error
//! 4. **Concurrency**: backfills and ticks merging at the same time

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use ht_block_sync::{
        BlockRecord, BlockSyncApi, BlockSyncService, ChainSource, FetchError, MockChainSource,
        SamplingRule, StatusLabel, SyncConfig, SyncError, TickOutcome,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Chain whose heights fail a scripted number of times before succeeding.
    struct ScriptedChain {
        head: Mutex<u64>,
        remaining_failures: Mutex<HashMap<u64, u32>>,
    }

    impl ScriptedChain {
        fn new(head: u64) -> Self {
            Self {
                head: Mutex::new(head),
                remaining_failures: Mutex::new(HashMap::new()),
            }
        }

        fn fail_times(&self, height: u64, times: u32) {
            self.remaining_failures.lock().insert(height, times);
        }

        fn set_head(&self, head: u64) {
            *self.head.lock() = head;
        }
    }

    #[async_trait]
    impl ChainSource for ScriptedChain {
        async fn get_head(&self) -> Result<BlockRecord, FetchError> {
            Ok(MockChainSource::block_at(*self.head.lock()))
        }

        async fn get_block(&self, height: u64) -> Result<BlockRecord, FetchError> {
            let mut failures = self.remaining_failures.lock();
            if let Some(left) = failures.get_mut(&height) {
                if *left > 0 {
                    *left -= 1;
                    return Err(FetchError::Transport("scripted".to_string()));
                }
            }
            Ok(MockChainSource::block_at(height))
        }

        fn source_id(&self) -> &str {
            "scripted-chain"
        }
    }

    fn rule(stride: u64, anchor: u64) -> SamplingRule {
        SamplingRule::new(format!("{}@{}", stride, anchor), "test", stride, anchor).unwrap()
    }

    fn mock_service(head: u64, config: SyncConfig) -> (Arc<MockChainSource>, BlockSyncService<MockChainSource>) {
        let source = Arc::new(MockChainSource::new(head));
        let service = BlockSyncService::new(config, Arc::clone(&source)).unwrap();
        (source, service)
    }

    fn heights(blocks: &[BlockRecord]) -> Vec<u64> {
        blocks.iter().map(|b| b.height).collect()
    }

    // =============================================================================
    // BACKFILL
    // =============================================================================

    #[tokio::test]
    async fn test_backfill_head_1000_stride_100() {
        let (_, service) = mock_service(1000, SyncConfig::default());
        let report = service.backfill(&rule(100, 0), 5).await.unwrap();

        assert_eq!(report.targets, vec![1000, 900, 800, 700, 600]);
        assert_eq!(heights(&service.snapshot()), vec![1000, 900, 800, 700, 600]);
    }

    #[tokio::test]
    async fn test_backfill_anchored_rule_stops_at_anchor() {
        let (_, service) = mock_service(1000, SyncConfig::default());
        let report = service.backfill(&rule(100, 750), 30).await.unwrap();

        assert_eq!(report.targets, vec![950, 850, 750]);
        assert_eq!(service.sampled_view(&rule(100, 750)).len(), 3);
    }

    #[tokio::test]
    async fn test_backfill_reports_skipped_heights() {
        let (source, service) = mock_service(1000, SyncConfig::default());
        source.fail_height(900);
        source.fail_height(700);

        let report = service.backfill(&rule(100, 0), 5).await.unwrap();
        let skipped: Vec<u64> = report.skipped.iter().map(|s| s.height).collect();
        assert_eq!(skipped, vec![700, 900]);
        assert_eq!(heights(&service.snapshot()), vec![1000, 800, 600]);
        assert!(matches!(
            report.skipped[0].clone().into_error(),
            SyncError::BlockFetchFailed { height: 700, .. }
        ));
    }

    #[tokio::test]
    async fn test_backfill_is_idempotent() {
        let (_, service) = mock_service(1000, SyncConfig::default());
        service.backfill(&rule(100, 0), 5).await.unwrap();
        let second = service.backfill(&rule(100, 0), 5).await.unwrap();

        assert_eq!(second.merge.inserted, 0);
        assert_eq!(second.merge.duplicates, 5);
        assert_eq!(service.snapshot().len(), 5);
    }

    // =============================================================================
    // POLL
    // =============================================================================

    #[tokio::test]
    async fn test_poll_gap_with_failed_height_retried() {
        let (source, service) = mock_service(500, SyncConfig::default());
        service.store().merge([MockChainSource::block_at(500)]);
        source.set_head(503);
        source.fail_height(501);

        service.poll_tick().await.unwrap();
        let stored = heights(&service.snapshot());
        assert!(stored.contains(&502) && stored.contains(&503));
        assert!(!stored.contains(&501));

        source.heal_height(501);
        source.clear_requests();
        service.poll_tick().await.unwrap();
        assert!(source.requested_heights().contains(&501));
        assert_eq!(heights(&service.snapshot()), vec![503, 502, 501, 500]);
    }

    #[tokio::test]
    async fn test_poll_from_empty_store_fills_capacity() {
        let (_, service) = mock_service(2500, SyncConfig::default());
        let outcome = service.poll_tick().await.unwrap();

        let TickOutcome::Synced(report) = outcome else {
            panic!("expected a synced tick, got {:?}", outcome);
        };
        assert_eq!(report.gap_from, Some(501));
        let snapshot = service.snapshot();
        assert_eq!(snapshot.len(), 2000);
        assert_eq!(snapshot.first().map(|b| b.height), Some(2500));
        assert_eq!(snapshot.last().map(|b| b.height), Some(501));
    }

    #[tokio::test]
    async fn test_flaky_height_recovered_by_ledger() {
        let chain = Arc::new(ScriptedChain::new(102));
        let service = BlockSyncService::new(SyncConfig::for_testing(), Arc::clone(&chain)).unwrap();
        service.store().merge([MockChainSource::block_at(100)]);
        chain.fail_times(101, 2);

        service.poll_tick().await.unwrap();
        assert_eq!(service.pending_retries(), vec![101]);
        service.poll_tick().await.unwrap();
        assert_eq!(service.pending_retries(), vec![101]);

        let TickOutcome::Synced(report) = service.poll_tick().await.unwrap() else {
            panic!("expected retry tick");
        };
        assert_eq!(report.retried, vec![101]);
        assert!(report.abandoned.is_empty());
        assert!(service.store().contains(101));
        assert!(service.pending_retries().is_empty());
    }

    #[tokio::test]
    async fn test_ledger_drops_heights_below_eviction_floor() {
        let config = SyncConfig {
            store_capacity: 5,
            ..SyncConfig::for_testing()
        };
        let chain = Arc::new(ScriptedChain::new(103));
        let service = BlockSyncService::new(config, Arc::clone(&chain)).unwrap();
        service
            .store()
            .merge((96..=100).map(MockChainSource::block_at));
        chain.fail_times(101, 10);

        service.poll_tick().await.unwrap();
        assert_eq!(heights(&service.snapshot()), vec![103, 102, 100, 99, 98]);
        assert_eq!(service.pending_retries(), vec![101]);

        chain.set_head(110);
        let TickOutcome::Synced(report) = service.poll_tick().await.unwrap() else {
            panic!("expected sync tick");
        };
        assert_eq!(report.gap_from, Some(106));
        assert_eq!(heights(&service.snapshot()), vec![110, 109, 108, 107, 106]);
        assert!(service.pending_retries().is_empty());
        assert!(report.abandoned.is_empty());
    }

    // =============================================================================
    // ERRORS
    // =============================================================================

    #[tokio::test]
    async fn test_head_failure_keeps_data_until_retry() {
        let (source, service) = mock_service(1000, SyncConfig::default());
        service.backfill(&rule(100, 0), 5).await.unwrap();

        source.set_head_failing(true);
        let err = service.poll_tick().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(service.snapshot().len(), 5);
        assert_eq!(service.status().label(), StatusLabel::Unauthorized);

        // Ticks alone do not clear the error; the backfill retry does.
        source.set_head_failing(false);
        service.poll_tick().await.unwrap();
        assert_eq!(service.status().label(), StatusLabel::Unauthorized);
        service.backfill(&rule(100, 0), 5).await.unwrap();
        assert_eq!(service.status().label(), StatusLabel::Listening);
    }

    #[tokio::test]
    async fn test_unauthorized_source() {
        let (source, service) = mock_service(1000, SyncConfig::default());
        source.set_head_failing(true);

        let result = service.ensure_coverage(&rule(20, 0)).await;
        assert!(matches!(result, Err(SyncError::HeadUnavailable(_))));
        assert!(service.snapshot().is_empty());
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_backfills_and_ticks_keep_invariants() {
        let config = SyncConfig {
            store_capacity: 300,
            fetch_concurrency: 4,
            ..SyncConfig::default()
        };
        let (source, service) = mock_service(5000, config);
        let service = Arc::new(service);

        let mut tasks = Vec::new();
        for stride in [1u64, 7, 20, 60, 100] {
            let service = Arc::clone(&service);
            tasks.push(tokio::spawn(async move {
                service.backfill(&rule(stride, 0), 30).await.map(|_| ())
            }));
        }
        for step in 0..5 {
            source.set_head(5000 + step * 10);
            let service = Arc::clone(&service);
            tasks.push(tokio::spawn(async move { service.poll_tick().await.map(|_| ()) }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let snapshot = heights(&service.snapshot());
        assert!(snapshot.len() <= 300);
        assert!(snapshot.windows(2).all(|w| w[0] > w[1]));
        assert!(!service.status().syncing);
        assert!(!service.status().backfilling);
    }
}
