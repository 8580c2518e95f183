//! # Application Module
//!
//! Application services orchestrating the domain and outbound ports.

pub mod fetcher;
pub mod poller;
pub mod service;
pub mod session;
pub mod stats;

pub use fetcher::{fetch_batch, FetchBatch};
pub use poller::{LivePoller, PollerHandle};
pub use service::BlockSyncService;
pub use session::SyncSession;
pub use stats::{SyncStats, SyncStatsSnapshot};
