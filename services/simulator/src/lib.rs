//! Candle replay harness
//!
//! Loads market candles and an optional chain snapshot, builds a pool mirror
//! from the engine configuration and runs a [`Replay`] over it.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;
use vamm::{Candle, Pool, RawSnapshot, Replay, ReplayReport};
use vamm_config::EngineConfig;

/// Read a JSON array of candles, oldest first
pub fn load_candles(path: &Path) -> Result<Vec<Candle>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read candles {:?}", path))?;
    let candles: Vec<Candle> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse candles {:?}", path))?;
    validate_candles(&candles)?;
    info!(count = candles.len(), "candles loaded");
    Ok(candles)
}

pub fn validate_candles(candles: &[Candle]) -> Result<()> {
    for (i, candle) in candles.iter().enumerate() {
        let prices = [candle.open, candle.high, candle.low, candle.close];
        if prices.iter().any(|p| !(*p > 0.0) || !p.is_finite()) {
            anyhow::bail!("candle {} at {} has a non-positive price", i, candle.time);
        }
        if candle.low > candle.high {
            anyhow::bail!("candle {} at {} has low above high", i, candle.time);
        }
        if i > 0 && candle.time <= candles[i - 1].time {
            anyhow::bail!("candle {} at {} is out of order", i, candle.time);
        }
    }
    Ok(())
}

/// Read a `vars()` snapshot exported as JSON
pub fn load_snapshot(path: &Path) -> Result<RawSnapshot> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read snapshot {:?}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse snapshot {:?}", path))
}

/// Mirror a snapshot if given, otherwise bootstrap from the configured seed
pub fn build_pool(config: &EngineConfig, snapshot: Option<&RawSnapshot>) -> Result<Pool> {
    let pool = match snapshot {
        Some(raw) => Pool::from_snapshot(config.curve, config.oracle, raw)
            .context("Failed to load pool from snapshot")?,
        None => Pool::bootstrap(
            config.curve,
            config.oracle,
            config.seed.balances(),
            config.seed.price_scale,
            config.seed.start_time,
        )
        .context("Failed to bootstrap pool")?,
    };
    info!(
        balances = ?pool.balances(),
        mark_price = pool.mark_price(),
        "pool ready"
    );
    Ok(pool)
}

pub fn run_replay(config: &EngineConfig, pool: Pool, candles: &[Candle]) -> ReplayReport {
    let mut replay = Replay::new(pool, config.sizing, config.simulation);
    replay.run(candles)
}

/// Write the report as pretty JSON, to stdout when no path is given
pub fn write_report(report: &ReplayReport, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    match path {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write report {:?}", path))?;
            info!("Report written to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
