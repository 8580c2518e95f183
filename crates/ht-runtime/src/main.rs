//! # Hash-Trend Runtime
//!
//! Runs the block sync engine against a simulated chain and prints the
//! active rule's bead plate.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use ht_block_sync::{ClassificationAxis, SamplingRule};
use ht_runtime::{Dashboard, RuntimeConfig};

/// Bead plate axis.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum AxisArg {
    /// ODD / EVEN
    Parity,
    /// BIG / SMALL
    Size,
}

impl From<AxisArg> for ClassificationAxis {
    fn from(value: AxisArg) -> Self {
        match value {
            AxisArg::Parity => ClassificationAxis::Parity,
            AxisArg::Size => ClassificationAxis::Size,
        }
    }
}

/// Hash-Trend: block sync and bead plate viewer
#[derive(Parser, Debug)]
#[command(name = "ht-runtime")]
#[command(about = "Sync recent blocks and print the bead plate of a sampling rule")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Id of the rule to show
    #[arg(short, long)]
    rule: Option<String>,

    /// Add and show a custom rule with this stride
    #[arg(long)]
    stride: Option<u64>,

    /// Anchor height for the custom rule
    #[arg(long, default_value = "0", requires = "stride")]
    anchor: u64,

    /// Bead plate axis
    #[arg(short, long, value_enum)]
    axis: Option<AxisArg>,

    /// Bead plate rows
    #[arg(long)]
    rows: Option<usize>,

    /// Seconds between printed frames
    #[arg(long)]
    report_secs: Option<u64>,

    /// Stop after this many seconds (runs until Ctrl+C when omitted)
    #[arg(short, long)]
    duration_secs: Option<u64>,

    /// Simulated block interval in milliseconds
    #[arg(long)]
    block_interval_ms: Option<u64>,

    /// Make every height divisible by N fail
    #[arg(long)]
    fail_every: Option<u64>,

    /// Print Prometheus metrics on exit
    #[arg(long)]
    metrics: bool,
}

impl Args {
    /// Apply command line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut RuntimeConfig) -> Result<()> {
        if let Some(stride) = self.stride {
            let rule = SamplingRule::custom("custom", stride, self.anchor)
                .context("invalid custom rule")?;
            config.view.active_rule = rule.id.clone();
            config.view.rules.push(rule);
        } else if let Some(rule) = &self.rule {
            config.view.active_rule = rule.clone();
        }
        if let Some(axis) = self.axis {
            config.view.axis = axis.into();
        }
        if let Some(rows) = self.rows {
            config.sync.grid_rows = rows;
        }
        if let Some(secs) = self.report_secs {
            config.view.report_interval_secs = secs;
        }
        if let Some(ms) = self.block_interval_ms {
            config.chain.block_interval_ms = ms;
        }
        if self.fail_every.is_some() {
            config.chain.fail_every = self.fail_every;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = RuntimeConfig::load(args.config.as_deref())?;
    args.apply(&mut config)?;

    let _telemetry = ht_telemetry::init_telemetry(&config.telemetry)
        .context("failed to initialize telemetry")?;

    let dashboard = Dashboard::start(&config)?;
    if let Err(e) = dashboard.ensure_coverage().await {
        warn!("Initial backfill failed: {}", e);
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(config.view.report_interval_secs));
    let deadline = async {
        match args.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    info!("Dashboard is running. Press Ctrl+C to stop.");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = dashboard.retry_if_failed().await {
                    warn!("Retry failed: {}", e);
                }
                println!("{}", dashboard.frame()?);
            }
            _ = &mut deadline => {
                info!("Run duration elapsed");
                break;
            }
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for Ctrl+C")?;
                info!("Shutdown signal received");
                break;
            }
        }
    }

    if args.metrics {
        dashboard.publish_metrics();
        println!("{}", ht_telemetry::encode_metrics()?);
    }
    dashboard.shutdown().await;

    Ok(())
}
