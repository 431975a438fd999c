//! VAMM replay simulator entry point

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vamm_config::load_config;
use vamm_simulator::{build_pool, load_candles, load_snapshot, run_replay, write_report};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment overlay from `environments/<name>.toml`
    #[arg(short, long)]
    env: Option<String>,

    /// Candles JSON file
    #[arg(long)]
    candles: PathBuf,

    /// Pool snapshot JSON; the configured seed is used when absent
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Report output path, stdout when absent
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Trade only to each candle's close
    #[arg(long)]
    close_only: bool,

    /// Replay at most this many candles
    #[arg(long)]
    max_candles: Option<usize>,

    /// Log filter, overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match &args.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "vamm=info,vamm_simulator=info".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting VAMM simulator");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config(args.config, args.env.as_deref())?;
    if args.close_only {
        config.simulation.close_only = true;
    }

    let snapshot = args.snapshot.as_deref().map(load_snapshot).transpose()?;
    let pool = build_pool(&config, snapshot.as_ref())?;

    let mut candles = load_candles(&args.candles)?;
    if let Some(max) = args.max_candles {
        candles.truncate(max);
    }

    let report = run_replay(&config, pool, &candles);
    if let Some(error) = &report.summary.error {
        warn!("Replay stopped early: {}", error);
    }
    info!(
        "Replayed {} candles, {} trades, volume {:.2}, avg slippage {:.4}%",
        report.summary.candles,
        report.summary.trades,
        report.summary.volume,
        report.summary.avg_slippage
    );

    write_report(&report, args.output.as_deref())
}
