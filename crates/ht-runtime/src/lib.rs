//! # Hash-Trend Runtime
//!
//! Command line front end for the block sync engine.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (TOML file, then CLI overrides)
//! 2. Initialize telemetry from the `[telemetry]` section or the environment
//! 3. Start a sync session over the simulated chain
//! 4. Backfill the active rule if its view is sparse
//! 5. Print a frame every report interval until Ctrl+C or the run duration ends
//!
//! ## Modules
//!
//! - `config` - `RuntimeConfig` and TOML loading
//! - `dashboard` - session, rule book and frame assembly
//! - `render` - plain-text bead plate, tally and status lines

pub mod config;
pub mod dashboard;
pub mod render;

pub use config::{ChainConfig, ConfigError, RuntimeConfig, ViewConfig};
pub use dashboard::Dashboard;
