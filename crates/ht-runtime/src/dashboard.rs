//! # Dashboard
//!
//! Wires a sync session over the simulated chain to a rule book and renders
//! frames of the active rule's bead plate.

use std::sync::Arc;
use std::time::Duration;

use ht_block_sync::{
    tally, BackfillReport, BlockSyncApi, BlockSyncService, ClassificationAxis, RuleBook,
    SamplingRule, SimulatedChain, SurfaceVisibility, SyncError, SyncSession, VisibilityFlag,
};
use ht_telemetry::{log_sync_event, publish_sync_sample, SyncSample};

use crate::config::{ConfigError, RuntimeConfig};
use crate::render::{render_plate, render_rule, render_status, render_tally};

/// Widest plate printed per frame.
const MAX_PRINTED_COLUMNS: usize = 40;

/// Running dashboard.
pub struct Dashboard {
    session: SyncSession<SimulatedChain>,
    chain: Arc<SimulatedChain>,
    visibility: Arc<VisibilityFlag>,
    rules: RuleBook,
    axis: ClassificationAxis,
    rows: usize,
}

impl Dashboard {
    /// Validate `config`, build the chain and start the sync session.
    pub fn start(config: &RuntimeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rules = config.rule_book()?;

        let mut chain = SimulatedChain::new(
            config.chain.seed.clone(),
            config.chain.genesis_height,
            Duration::from_millis(config.chain.block_interval_ms),
        );
        if let Some(n) = config.chain.fail_every {
            chain = chain.with_fail_every(n);
        }
        let chain = Arc::new(chain);

        let visibility = Arc::new(VisibilityFlag::default());
        let session = SyncSession::start(
            Arc::clone(&chain),
            config.sync.clone(),
            Arc::clone(&visibility) as Arc<dyn SurfaceVisibility>,
        )?;

        log_sync_event!(
            info,
            "runtime",
            "Dashboard started",
            rule = %rules.active().id,
            genesis = config.chain.genesis_height
        );

        Ok(Self {
            session,
            chain,
            visibility,
            rules,
            axis: config.view.axis,
            rows: config.sync.grid_rows,
        })
    }

    /// The sync service.
    pub fn service(&self) -> &Arc<BlockSyncService<SimulatedChain>> {
        self.session.service()
    }

    /// The simulated chain.
    pub fn chain(&self) -> &Arc<SimulatedChain> {
        &self.chain
    }

    /// The rule book.
    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Active rule.
    pub fn active_rule(&self) -> &SamplingRule {
        self.rules.active()
    }

    /// Pause or resume polling, as when the dashboard is hidden.
    pub fn set_visible(&self, visible: bool) {
        self.visibility.set(visible);
    }

    /// Backfill the active rule if its view is sparse.
    pub async fn ensure_coverage(&self) -> Result<Option<BackfillReport>, SyncError> {
        let report = self.service().ensure_coverage(self.rules.active()).await?;
        if let Some(report) = &report {
            log_sync_event!(
                info,
                "backfill",
                "Coverage backfill",
                head = report.head,
                fetched = report.fetched,
                skipped = report.skipped.len()
            );
        }
        Ok(report)
    }

    /// Switch the active rule and backfill it if needed.
    pub async fn activate_rule(&mut self, id: &str) -> Result<Option<BackfillReport>, SyncError> {
        self.rules.activate(id)?;
        self.ensure_coverage().await
    }

    /// Retry after a head failure: re-run the coverage backfill when an error is shown.
    pub async fn retry_if_failed(&self) -> Result<Option<BackfillReport>, SyncError> {
        if self.service().status().last_error.is_none() {
            return Ok(None);
        }
        self.service()
            .backfill(self.rules.active(), self.service().config().backfill_target)
            .await
            .map(Some)
    }

    /// Render one frame: rule, status, tally and plate.
    pub fn frame(&self) -> Result<String, SyncError> {
        let rule = self.rules.active();
        let view = self.service().sampled_view(rule);
        let plate = self.service().bead_plate(rule, self.axis, self.rows)?;

        Ok(format!(
            "{}\n{}\n{}\n{}",
            render_rule(rule),
            render_status(&self.service().status()),
            render_tally(&tally(&view, self.axis), self.axis),
            render_plate(&plate, MAX_PRINTED_COLUMNS)
        ))
    }

    /// Publish engine counters to the metrics registry.
    pub fn publish_metrics(&self) {
        let stats = self.service().stats().snapshot();
        let status = self.service().status();
        publish_sync_sample(&SyncSample {
            ticks_run: stats.ticks_run,
            ticks_skipped: stats.ticks_skipped,
            blocks_fetched: stats.blocks_fetched,
            block_failures: stats.fetch_failures,
            head_failures: stats.head_failures,
            backfills: stats.backfills,
            heights_abandoned: stats.heights_abandoned,
            store_blocks: status.store_len as u64,
            store_max_height: status.max_height,
        });
    }

    /// Stop the poller.
    pub async fn shutdown(self) {
        self.session.shutdown().await;
    }
}
