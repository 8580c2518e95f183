//! Prometheus metrics for the sync engine.
//!
//! All metrics follow the naming convention: `ht_sync_<metric>_<unit>`
//!
//! The engine keeps its own lock-free counters; the runtime publishes a
//! [`SyncSample`] of them here before rendering.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Poller ticks by outcome (run/skipped)
    pub static ref POLL_TICKS: IntCounterVec = IntCounterVec::new(
        Opts::new("ht_sync_poll_ticks_total", "Poller ticks by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Records fetched
    pub static ref BLOCKS_FETCHED: IntCounter = IntCounter::new(
        "ht_sync_blocks_fetched_total",
        "Total block records fetched from the chain source"
    ).expect("metric creation failed");

    /// Fetch failures by kind (block/head)
    pub static ref FETCH_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("ht_sync_fetch_failures_total", "Failed fetches by kind"),
        &["kind"]
    ).expect("metric creation failed");

    /// Backfills run
    pub static ref BACKFILLS: IntCounter = IntCounter::new(
        "ht_sync_backfills_total",
        "Total backfills run"
    ).expect("metric creation failed");

    /// Gap heights given up on
    pub static ref HEIGHTS_ABANDONED: IntCounter = IntCounter::new(
        "ht_sync_heights_abandoned_total",
        "Gap heights dropped after repeated failures"
    ).expect("metric creation failed");

    /// Records currently stored
    pub static ref STORE_BLOCKS: IntGauge = IntGauge::new(
        "ht_sync_store_blocks",
        "Block records currently in the store"
    ).expect("metric creation failed");

    /// Highest stored height
    pub static ref STORE_MAX_HEIGHT: IntGauge = IntGauge::new(
        "ht_sync_store_max_height",
        "Highest block height in the store"
    ).expect("metric creation failed");
}

/// Cumulative engine counters plus store gauges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncSample {
    /// Poller ticks that ran
    pub ticks_run: u64,
    /// Poller ticks skipped
    pub ticks_skipped: u64,
    /// Records fetched
    pub blocks_fetched: u64,
    /// Per-height fetch failures
    pub block_failures: u64,
    /// Chain head failures
    pub head_failures: u64,
    /// Backfills run
    pub backfills: u64,
    /// Gap heights given up on
    pub heights_abandoned: u64,
    /// Records in the store
    pub store_blocks: u64,
    /// Highest stored height
    pub store_max_height: u64,
}

/// Register all metrics with the global registry. Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(POLL_TICKS.clone()),
        Box::new(BLOCKS_FETCHED.clone()),
        Box::new(FETCH_FAILURES.clone()),
        Box::new(BACKFILLS.clone()),
        Box::new(HEIGHTS_ABANDONED.clone()),
        Box::new(STORE_BLOCKS.clone()),
        Box::new(STORE_MAX_HEIGHT.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Raise `counter` to the cumulative `value`.
fn advance(counter: &IntCounter, value: u64) {
    let delta = value.saturating_sub(counter.get());
    if delta > 0 {
        counter.inc_by(delta);
    }
}

/// Publish a sample of the engine counters.
pub fn publish_sync_sample(sample: &SyncSample) {
    advance(&POLL_TICKS.with_label_values(&["run"]), sample.ticks_run);
    advance(&POLL_TICKS.with_label_values(&["skipped"]), sample.ticks_skipped);
    advance(&BLOCKS_FETCHED, sample.blocks_fetched);
    advance(&FETCH_FAILURES.with_label_values(&["block"]), sample.block_failures);
    advance(&FETCH_FAILURES.with_label_values(&["head"]), sample.head_failures);
    advance(&BACKFILLS, sample.backfills);
    advance(&HEIGHTS_ABANDONED, sample.heights_abandoned);
    STORE_BLOCKS.set(sample.store_blocks as i64);
    STORE_MAX_HEIGHT.set(sample.store_max_height as i64);
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
