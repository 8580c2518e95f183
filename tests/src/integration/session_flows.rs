//! # Session Flow Tests
//!
//! The poller running inside a session: visibility gating, busy skips,
//! restarts after a credential change, and the runtime dashboard on top.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use ht_block_sync::{
        AlwaysVisible, BlockSyncApi, MockChainSource, SamplingRule, SurfaceVisibility,
        SyncConfig, SyncSession, VisibilityFlag,
    };
    use ht_runtime::{Dashboard, RuntimeConfig};

    fn start(
        source: &Arc<MockChainSource>,
        visibility: Arc<dyn SurfaceVisibility>,
    ) -> SyncSession<MockChainSource> {
        SyncSession::start(Arc::clone(source), SyncConfig::for_testing(), visibility).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_surface_pauses_polling() {
        let source = Arc::new(MockChainSource::new(10));
        let visibility = Arc::new(VisibilityFlag::new(false));
        let session = start(&source, Arc::clone(&visibility) as Arc<dyn SurfaceVisibility>);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let stats = session.service().stats().snapshot();
        assert!(stats.ticks_skipped >= 3);
        assert_eq!(stats.ticks_run, 0);
        assert!(session.service().snapshot().is_empty());

        visibility.set(true);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(session.service().status().max_height, 10);
        assert_eq!(session.service().snapshot().len(), 10);

        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_skips_overlapping_ticks() {
        let source = Arc::new(MockChainSource::new(5));
        source.set_delay(Some(Duration::from_millis(50)));
        let session = start(&source, Arc::new(AlwaysVisible));

        tokio::time::sleep(Duration::from_millis(400)).await;
        let stats = session.service().stats().snapshot();
        assert!(stats.ticks_run > 0);
        assert!(stats.ticks_skipped > 0);
        assert!(session.service().store().contains(5));

        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_starts_from_empty_store() {
        let source = Arc::new(MockChainSource::new(1000));
        let rule = SamplingRule::new("100", "every 100", 100, 0).unwrap();

        let first = start(&source, Arc::new(AlwaysVisible));
        first.service().ensure_coverage(&rule).await.unwrap();
        assert!(!first.service().snapshot().is_empty());
        first.shutdown().await;

        let second = start(&source, Arc::new(AlwaysVisible));
        assert!(second.service().snapshot().is_empty());
        assert!(second.service().pending_retries().is_empty());
        second.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dashboard_from_toml() {
        let config = RuntimeConfig::from_toml(
            r#"
            [sync]
            poll_interval_ms = 50

            [chain]
            genesis_height = 500
            block_interval_ms = 100

            [view]
            active_rule = "anchored"
            axis = "size"

            [[view.rules]]
            id = "anchored"
            label = "from 105"
            stride = 20
            anchorHeight = 105
            "#,
        )
        .unwrap();

        let dashboard = Dashboard::start(&config).unwrap();
        let report = dashboard.ensure_coverage().await.unwrap().unwrap();
        assert_eq!(report.head, 500);
        assert_eq!(report.targets.first(), Some(&485));
        assert_eq!(report.targets.last(), Some(&105));

        let frame = dashboard.frame().unwrap();
        assert!(frame.starts_with("rule anchored (from 105): every 20 from 105"));
        assert!(frame.contains("[LISTENING]"));

        dashboard.set_visible(false);
        dashboard.shutdown().await;
    }
}
