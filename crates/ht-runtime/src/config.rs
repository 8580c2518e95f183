//! # Runtime Configuration
//!
//! Unified configuration for the sync engine, telemetry, the simulated chain
//! and the dashboard view. Loaded from an optional TOML file; every section
//! and field falls back to its default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use ht_block_sync::{ClassificationAxis, RuleBook, SamplingRule, SyncConfig, SyncError};
use ht_telemetry::TelemetryConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values were parsed but rejected.
    #[error(transparent)]
    Invalid(#[from] SyncError),
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Sync engine configuration.
    pub sync: SyncConfig,
    /// Logging configuration. Taken from the environment when the section is absent.
    #[serde(default = "TelemetryConfig::from_env")]
    pub telemetry: TelemetryConfig,
    /// Simulated chain configuration.
    pub chain: ChainConfig,
    /// Dashboard view configuration.
    pub view: ViewConfig,
}

/// Simulated chain configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChainConfig {
    /// Hash seed.
    pub seed: String,
    /// Head height at startup.
    pub genesis_height: u64,
    /// Time between blocks in milliseconds.
    pub block_interval_ms: u64,
    /// Every height divisible by this fails.
    pub fail_every: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            seed: "hash-trend".to_string(),
            genesis_height: 60_000_000,
            block_interval_ms: 3000,
            fail_every: None,
        }
    }
}

/// Dashboard view configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ViewConfig {
    /// Available sampling rules.
    pub rules: Vec<SamplingRule>,
    /// Id of the rule shown at startup.
    pub active_rule: String,
    /// Bead plate axis.
    pub axis: ClassificationAxis,
    /// Seconds between printed frames.
    pub report_interval_secs: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        let rules = RuleBook::default_rules();
        let active_rule = rules
            .first()
            .map(|rule| rule.id.clone())
            .unwrap_or_default();
        Self {
            rules,
            active_rule,
            axis: ClassificationAxis::Parity,
            report_interval_secs: 3,
        }
    }
}

impl RuntimeConfig {
    /// Load from `path`, or defaults (telemetry from the environment) when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&text)?
            }
            None => Self {
                telemetry: TelemetryConfig::from_env(),
                ..Self::default()
            },
        };
        Ok(config)
    }

    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reject values the runtime cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sync.validate()?;
        if self.chain.block_interval_ms == 0 {
            return Err(SyncError::InvalidConfig("block_interval_ms must be >= 1".to_string()).into());
        }
        if self.view.report_interval_secs == 0 {
            return Err(
                SyncError::InvalidConfig("report_interval_secs must be >= 1".to_string()).into(),
            );
        }
        self.rule_book()?;
        Ok(())
    }

    /// Rule book from the view section with the configured rule active.
    pub fn rule_book(&self) -> Result<RuleBook, ConfigError> {
        let mut book = RuleBook::new(self.view.rules.clone())?;
        book.activate(&self.view.active_rule)?;
        Ok(book)
    }
}
