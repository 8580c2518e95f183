//! # Outbound Ports
//!
//! Traits for external dependencies: the chain data source and the consumer
//! surface's visibility.

use crate::domain::{BlockRecord, FetchError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Chain data source - outbound port.
///
/// Implementations own transport, credentials and payload normalization.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Current chain head.
    async fn get_head(&self) -> Result<BlockRecord, FetchError>;

    /// Block at exactly `height`.
    async fn get_block(&self, height: u64) -> Result<BlockRecord, FetchError>;

    /// Source identifier (for logging).
    fn source_id(&self) -> &str;
}

/// Whether the consumer surface is currently observable - outbound port.
///
/// Poller ticks are skipped while this returns false.
pub trait SurfaceVisibility: Send + Sync {
    /// True when someone is looking.
    fn is_observable(&self) -> bool;
}

/// Surface that is always observable (headless consumers).
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysVisible;

impl SurfaceVisibility for AlwaysVisible {
    fn is_observable(&self) -> bool {
        true
    }
}

/// Togglable visibility flag, set by the consumer.
#[derive(Debug)]
pub struct VisibilityFlag {
    visible: AtomicBool,
}

impl VisibilityFlag {
    /// Create a flag with an initial state.
    pub fn new(visible: bool) -> Self {
        Self {
            visible: AtomicBool::new(visible),
        }
    }

    /// Update the state.
    pub fn set(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }
}

impl Default for VisibilityFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SurfaceVisibility for VisibilityFlag {
    fn is_observable(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

#[derive(Debug, Default)]
struct MockChainState {
    head: u64,
    head_fails: bool,
    failing: HashSet<u64>,
    delay: Option<Duration>,
    requests: Vec<u64>,
}

/// Mock chain source for testing.
///
/// Serves a synthetic block for every height in `1..=head`. Individual
/// heights and the head can be made to fail, and every request can be
/// delayed to simulate a slow upstream.
#[derive(Debug)]
pub struct MockChainSource {
    id: String,
    state: RwLock<MockChainState>,
}

impl MockChainSource {
    /// Create a source whose head is at `head`.
    pub fn new(head: u64) -> Self {
        Self {
            id: "mock-chain".to_string(),
            state: RwLock::new(MockChainState {
                head,
                ..Default::default()
            }),
        }
    }

    /// The record this source serves for `height`.
    pub fn block_at(height: u64) -> BlockRecord {
        let mixed = height.wrapping_mul(2_654_435_761);
        BlockRecord::new(height, format!("{:064x}", mixed), height % 10, height * 3000)
    }

    /// Move the head.
    pub fn set_head(&self, head: u64) {
        self.state.write().head = head;
    }

    /// Make head requests fail (or succeed again).
    pub fn set_head_failing(&self, failing: bool) {
        self.state.write().head_fails = failing;
    }

    /// Make `height` fail until healed.
    pub fn fail_height(&self, height: u64) {
        self.state.write().failing.insert(height);
    }

    /// Let `height` succeed again.
    pub fn heal_height(&self, height: u64) {
        self.state.write().failing.remove(&height);
    }

    /// Delay every request.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state.write().delay = delay;
    }

    /// Heights requested through `get_block`, in request order.
    pub fn requested_heights(&self) -> Vec<u64> {
        self.state.read().requests.clone()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        self.state.write().requests.clear();
    }

    async fn simulate_latency(&self) {
        let delay = self.state.read().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for MockChainSource {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl ChainSource for MockChainSource {
    async fn get_head(&self) -> Result<BlockRecord, FetchError> {
        self.simulate_latency().await;
        let state = self.state.read();
        if state.head_fails {
            return Err(FetchError::Transport("Mock head failure".to_string()));
        }
        Ok(Self::block_at(state.head))
    }

    async fn get_block(&self, height: u64) -> Result<BlockRecord, FetchError> {
        self.simulate_latency().await;
        let mut state = self.state.write();
        state.requests.push(height);
        if state.failing.contains(&height) {
            return Err(FetchError::Transport(format!("Mock failure at {}", height)));
        }
        if height == 0 || height > state.head {
            return Err(FetchError::NotFound { height });
        }
        Ok(Self::block_at(height))
    }

    fn source_id(&self) -> &str {
        &self.id
    }
}
