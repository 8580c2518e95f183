//! # Simulated Chain Adapter
//!
//! Implements `ChainSource` with an in-process chain whose head advances
//! with wall-clock time. Block contents are derived from a SHA-256 of the
//! seed and height, so every run serves the same block for the same height.

use crate::domain::{BlockRecord, FetchError};
use crate::ports::outbound::ChainSource;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Deterministic chain that produces one block per `block_interval`.
pub struct SimulatedChain {
    /// Source identifier.
    id: String,
    /// Hash seed.
    seed: String,
    /// Head height at `started`.
    genesis_height: u64,
    /// Unix millis of the genesis block.
    genesis_millis: u64,
    /// Time between blocks.
    block_interval: Duration,
    /// When the chain was created.
    started: Instant,
    /// Every height divisible by this fails with a transport error.
    fail_every: Option<u64>,
    /// Credential state.
    authorized: AtomicBool,
}

impl SimulatedChain {
    /// Create a chain whose head starts at `genesis_height`.
    pub fn new(seed: impl Into<String>, genesis_height: u64, block_interval: Duration) -> Self {
        let genesis_millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            id: "simulated-chain".to_string(),
            seed: seed.into(),
            genesis_height,
            genesis_millis,
            block_interval: block_interval.max(Duration::from_millis(1)),
            started: Instant::now(),
            fail_every: None,
            authorized: AtomicBool::new(true),
        }
    }

    /// Make every height divisible by `n` fail.
    pub fn with_fail_every(mut self, n: u64) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    /// Reject (or accept again) every request as unauthorized.
    pub fn set_authorized(&self, authorized: bool) {
        self.authorized.store(authorized, Ordering::SeqCst);
        if !authorized {
            warn!("[ht-sync] Simulated credential revoked for {}", self.id);
        }
    }

    /// Current head height.
    pub fn head_height(&self) -> u64 {
        let produced = self.started.elapsed().as_millis() / self.block_interval.as_millis();
        self.genesis_height + produced as u64
    }

    /// Record for `height`, regardless of the head.
    pub fn block_at(&self, height: u64) -> BlockRecord {
        let hash = hex::encode(Sha256::digest(format!("{}:{}", self.seed, height).as_bytes()));
        let result_value = hash
            .chars()
            .rev()
            .find_map(|c| c.to_digit(10))
            .unwrap_or(0) as u64;

        let interval_ms = self.block_interval.as_millis() as u64;
        let timestamp = if height >= self.genesis_height {
            self.genesis_millis + (height - self.genesis_height) * interval_ms
        } else {
            self.genesis_millis
                .saturating_sub((self.genesis_height - height) * interval_ms)
        };

        BlockRecord::new(height, hash, result_value, timestamp)
    }

    fn check_authorized(&self) -> Result<(), FetchError> {
        if self.authorized.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(FetchError::Unauthorized)
        }
    }
}

#[async_trait]
impl ChainSource for SimulatedChain {
    async fn get_head(&self) -> Result<BlockRecord, FetchError> {
        self.check_authorized()?;
        Ok(self.block_at(self.head_height()))
    }

    async fn get_block(&self, height: u64) -> Result<BlockRecord, FetchError> {
        self.check_authorized()?;
        debug!("[ht-sync] Serving simulated block {}", height);

        if height == 0 || height > self.head_height() {
            return Err(FetchError::NotFound { height });
        }
        if let Some(n) = self.fail_every {
            if height % n == 0 {
                return Err(FetchError::Transport(format!(
                    "simulated failure at {}",
                    height
                )));
            }
        }
        Ok(self.block_at(height))
    }

    fn source_id(&self) -> &str {
        &self.id
    }
}
