//! # HT Block Sync
//!
//! Block synchronization and sampling engine for a hash-trend dashboard.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Keep a bounded, deduplicated window of recent chain blocks in memory,
//! sample it by a stride/anchor rule and lay the sample out as a bead plate:
//! - Backfill of rule-aligned heights below the chain head
//! - Live polling of new heights with overlap protection
//! - Retry of heights that failed mid-gap
//!
//! ## Guarantees
//!
//! | Property | Description |
//! |----------|-------------|
//! | Ordering | Store snapshots are strictly descending by height |
//! | Dedup | The first record stored for a height is kept |
//! | Bound | The store never holds more than its capacity |
//! | Best effort | Per-height failures are skipped and reported, never fatal |
//!
//! ## Module Structure
//!
//! ```text
//! ht-block-sync/
//! ├── domain/          # BlockRecord, BlockStore, SamplingRule, RuleBook, errors
//! ├── algorithms/      # Alignment filter, sync planning, bead plate layout
//! ├── ports/           # API trait (inbound) + chain source, visibility (outbound)
//! ├── application/     # BlockSyncService, LivePoller, SyncSession
//! ├── adapters/        # SimulatedChain
//! └── config.rs        # SyncConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::SimulatedChain;
pub use algorithms::{
    align_down, backfill_targets, build_bead_grid, classify, gap_range, is_aligned, sample_view,
    tally, GridColumn,
};
pub use application::{
    fetch_batch, BlockSyncService, FetchBatch, LivePoller, PollerHandle, SyncSession, SyncStats,
    SyncStatsSnapshot,
};
pub use config::SyncConfig;
pub use domain::{
    BackfillReport, BlockRecord, BlockStore, BlockType, Classification, ClassificationAxis,
    ClassificationTally, FetchError, GapReport, GridCell, MergeOutcome, RuleBook, SamplingRule,
    SizeType, SkipReason, SkippedHeight, StatusLabel, SyncError, SyncStatus, TickOutcome,
    BIG_THRESHOLD, DEFAULT_STORE_CAPACITY,
};
pub use ports::{
    AlwaysVisible, BlockSyncApi, ChainSource, MockChainSource, SurfaceVisibility, VisibilityFlag,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
