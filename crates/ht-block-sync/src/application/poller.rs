//! # Live Poller
//!
//! Recurring timer driving [`BlockSyncApi::poll_tick`].
//!
//! Each tick runs in its own task, so a slow tick never delays the timer.
//! Overlap is resolved by the service's busy flag, not here.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::domain::TickOutcome;
use crate::ports::BlockSyncApi;

/// Live poller spawner.
pub struct LivePoller;

impl LivePoller {
    /// Start ticking `service` every `period`. The first tick fires after one
    /// period.
    pub fn spawn<T>(service: Arc<T>, period: Duration) -> PollerHandle
    where
        T: BlockSyncApi + ?Sized + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let service = Arc::clone(&service);
                        tokio::spawn(async move {
                            match service.poll_tick().await {
                                Ok(TickOutcome::Synced(report)) => {
                                    tracing::debug!(
                                        head = report.head,
                                        fetched = report.fetched,
                                        "[ht-sync] Poller tick merged blocks"
                                    );
                                }
                                Ok(_) => {}
                                Err(e) => {
                                    tracing::warn!("[ht-sync] Poller tick failed: {}", e);
                                }
                            }
                        });
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::info!("[ht-sync] Poller shutdown signal received");
                        break;
                    }
                }
            }
        });

        tracing::info!(period_ms = period.as_millis() as u64, "[ht-sync] Poller started");
        PollerHandle { shutdown_tx, task }
    }
}

/// Handle to a running poller.
pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Whether the timer task is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Signal shutdown and wait for the timer task to exit.
    ///
    /// A tick already in flight finishes on its own.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::error!("[ht-sync] Poller task ended abnormally: {}", e);
        }
    }
}
