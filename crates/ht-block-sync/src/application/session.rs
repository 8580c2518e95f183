//! # Sync Session
//!
//! A service paired with its poller. A credential change ends the session;
//! the next one starts from an empty store.

use std::sync::Arc;

use super::poller::{LivePoller, PollerHandle};
use super::service::BlockSyncService;
use crate::config::SyncConfig;
use crate::domain::SyncError;
use crate::ports::{ChainSource, SurfaceVisibility};

/// Running sync session.
pub struct SyncSession<S: ChainSource + 'static> {
    service: Arc<BlockSyncService<S>>,
    poller: PollerHandle,
}

impl<S: ChainSource + 'static> SyncSession<S> {
    /// Build a fresh service over `source` and start its poller.
    ///
    /// # Errors
    /// - `InvalidConfig` if `config` does not validate
    pub fn start(
        source: Arc<S>,
        config: SyncConfig,
        visibility: Arc<dyn SurfaceVisibility>,
    ) -> Result<Self, SyncError> {
        let period = config.poll_interval();
        let service = Arc::new(BlockSyncService::new(config, source)?.with_visibility(visibility));
        let poller = LivePoller::spawn(Arc::clone(&service), period);

        tracing::info!(
            source = service.source().source_id(),
            "[ht-sync] Session started"
        );
        Ok(Self { service, poller })
    }

    /// The session's service.
    pub fn service(&self) -> &Arc<BlockSyncService<S>> {
        &self.service
    }

    /// Stop the poller. The service stays usable through any clones of its `Arc`.
    pub async fn shutdown(self) {
        self.poller.stop().await;
        tracing::info!("[ht-sync] Session stopped");
    }
}
