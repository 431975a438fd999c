//! Historical replay of market candles against a pool
//!
//! Each candle is turned into a short path of target prices. For every
//! target the replay sizes a trade, executes it, and then values a tracked
//! maker against the pool. The first failure stops the replay; the rows
//! collected up to that point are still returned.

use crate::error::Result;
use crate::optimal_size::{OptimalSizeCalculator, SizingConfig};
use crate::pool::Pool;
use crate::position::MakerBasis;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const DAYS_PER_YEAR_PCT: f64 = 36_500.0;

/// One OHLC bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time, unix seconds
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// Price path the replay walks through for this bar
    ///
    /// Up bars are assumed to visit the low before the high, down bars the
    /// high before the low.
    pub fn targets(&self, close_only: bool) -> Vec<f64> {
        if close_only {
            vec![self.close]
        } else if self.close > self.open {
            vec![self.open, self.low, self.high, self.close]
        } else {
            vec![self.open, self.high, self.low, self.close]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Trade only to each bar's close
    pub close_only: bool,
    /// Pool fraction held by the tracked maker
    pub maker_share: f64,
    /// Relative move used for the depth column
    pub depth_band: f64,
    /// Bars per day, for annualizing maker PnL
    pub candles_per_day: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            close_only: false,
            maker_share: 0.002,
            depth_band: 0.005,
            candles_per_day: 1_440.0,
        }
    }
}

/// Per-candle replay output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayRow {
    pub time: i64,
    pub close_price: f64,
    pub mark_price: f64,
    pub depth: f64,
    /// Quote traded during the bar
    pub volume: f64,
    /// Average slippage of the bar's trades, in percent
    pub slippage: f64,
    pub position: f64,
    pub open_notional: f64,
    pub unrealized_pnl: f64,
    /// Annualized maker return, in percent
    pub apr: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub candles: usize,
    pub trades: usize,
    pub volume: f64,
    /// Average slippage per trade, in percent
    pub avg_slippage: f64,
    /// Failure that stopped the replay early
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub rows: Vec<ReplayRow>,
    pub summary: ReplaySummary,
}

/// Drives a pool through historical candles
#[derive(Debug)]
pub struct Replay {
    pool: Pool,
    maker: MakerBasis,
    liquidity: f64,
    calculator: OptimalSizeCalculator,
    config: ReplayConfig,
}

impl Replay {
    /// Replay with a maker owning `config.maker_share` of the pool
    pub fn new(pool: Pool, sizing: SizingConfig, config: ReplayConfig) -> Self {
        let maker = MakerBasis::pro_rata(&pool.snapshot(), config.maker_share);
        Self::with_maker(pool, maker, sizing, config)
    }

    pub fn with_maker(
        pool: Pool,
        maker: MakerBasis,
        sizing: SizingConfig,
        config: ReplayConfig,
    ) -> Self {
        let liquidity = maker.notional(pool.snapshot().price_scale);
        Self {
            pool,
            maker,
            liquidity,
            calculator: OptimalSizeCalculator::new(sizing),
            config,
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn run(&mut self, candles: &[Candle]) -> ReplayReport {
        let mut report = ReplayReport::default();
        let mut total_slippage = 0.0;

        for (i, candle) in candles.iter().enumerate() {
            match self.step(i, candle) {
                Ok((row, trades, slippage)) => {
                    report.summary.trades += trades;
                    report.summary.volume += row.volume;
                    report.summary.candles += 1;
                    total_slippage += slippage;
                    report.rows.push(row);
                }
                Err(e) => {
                    warn!(time = candle.time, error = %e, "replay stopped");
                    report.summary.error = Some(e.to_string());
                    break;
                }
            }
        }

        if report.summary.trades > 0 {
            report.summary.avg_slippage = total_slippage / report.summary.trades as f64;
        }
        info!(
            candles = report.summary.candles,
            trades = report.summary.trades,
            volume = report.summary.volume,
            avg_slippage = report.summary.avg_slippage,
            "replay finished"
        );
        report
    }

    /// Trade one candle; returns the row, trade count and summed slippage
    fn step(&mut self, index: usize, candle: &Candle) -> Result<(ReplayRow, usize, f64)> {
        let mut trades = 0;
        let mut volume = 0.0;
        let mut slippage = 0.0;

        for target in candle.targets(self.config.close_only) {
            let mark_price = self.pool.mark_price();
            let size = self.calculator.size_to_target(&self.pool, target)?;
            if size == 0.0 {
                continue;
            }

            let execution = if size > 0.0 {
                self.pool.execute_long(size, f64::MAX)?
            } else {
                self.pool.execute_short(size.abs(), 0.0)?
            };
            slippage += (execution.price - mark_price).abs() * 100.0 / mark_price;
            volume += execution.amount;
            trades += 1;
        }

        let maker = self.pool.maker_position(
            self.maker.dtoken,
            self.maker.vusd,
            self.maker.vasset,
            self.maker.dtoken,
        )?;
        let apr = maker.unrealized_pnl * self.config.candles_per_day * DAYS_PER_YEAR_PCT
            / (self.liquidity * (index + 1) as f64);
        let depth = self.calculator.depth(&self.pool, self.config.depth_band)?;

        let row = ReplayRow {
            time: candle.time,
            close_price: candle.close,
            mark_price: self.pool.mark_price(),
            depth,
            volume,
            slippage: if trades > 0 {
                slippage / trades as f64
            } else {
                0.0
            },
            position: maker.position,
            open_notional: maker.open_notional,
            unrealized_pnl: maker.unrealized_pnl,
            apr,
        };
        debug!(?row, "candle replayed");
        Ok((row, trades, slippage))
    }
}
