//! # VAMM Pricing Engine - Crypto-Invariant Curve Mirror
//!
//! ## Purpose
//!
//! Off-chain mirror of a two-asset virtual AMM priced by the Curve v2 crypto
//! invariant. Reproduces the on-chain contract's quotes, mark price, oracle
//! tracking and repegging, and maker/taker position valuation, so trades and
//! liquidity can be evaluated before they are sent and historical markets can
//! be replayed offline.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Decoded `vars()` snapshots ([`RawSnapshot`]), curve
//!   and oracle parameters from configuration, OHLC candles for replays
//! - **Output Destinations**: Trading clients (quotes, slippage bounds),
//!   risk checks (maker/taker PnL), simulation reports
//! - **Assets**: Index 0 is the quote asset (vUSD, 6 decimals on chain),
//!   index 1 the base asset (18 decimals)
//! - **Validation**: Every solver checks its inputs and intermediates against
//!   the contract's safety bands and fails with a typed [`VammError`]
//!
//! ## Architecture Role
//!
//! ```text
//!  RawSnapshot ──decode──> PoolState ──> Pool ──quote_long/short──> TradeQuote
//!                                         │
//!          invariant::solve_d <───────────┤  execute_long/short
//!          balance::solve_y   <───────────┤        │
//!                                         │        v
//!                                         │  oracle::tweak_price ──> RepegOutcome
//!                                         │
//!                                         ├──> position (maker / taker PnL)
//!                                         └──> optimal_size ──> simulation::Replay
//! ```
//!
//! ## Numeric Model
//!
//! All arithmetic is `f64`. The contract works in 1e18 fixed point; the
//! mirror converts once at the boundary ([`snapshot`]) and relies on the
//! solvers' `1e-18` convergence slack. Quotes agree with the contract to well
//! below a basis point, which is what pre-trade estimation needs. Exact
//! settlement amounts always come from the chain.
//!
//! ## State Changes
//!
//! Executions and oracle updates operate on a copy of the pool state and
//! commit only when every step succeeds. A slippage rejection, solver
//! failure or detected loss leaves the pool exactly as it was.

pub mod balance;
pub mod error;
pub mod invariant;
pub mod optimal_size;
pub mod oracle;
pub mod params;
pub mod pool;
pub mod pool_traits;
pub mod position;
pub mod quote;
pub mod simulation;
pub mod snapshot;
pub mod state;

pub use balance::solve_y;
pub use error::{MathError, Result, VammError};
pub use invariant::{get_d, solve_d};
pub use optimal_size::{OptimalSizeCalculator, SizingConfig};
pub use oracle::{tweak_price, RepegOutcome};
pub use params::{CurveParams, OracleParams};
pub use pool::{Execution, Pool};
pub use pool_traits::QuotingPool;
pub use position::{MakerBasis, MakerPosition, TakerPosition};
pub use quote::{calc_mark_price, get_dx, get_dy, TradeQuote};
pub use simulation::{Candle, Replay, ReplayConfig, ReplayReport, ReplayRow, ReplaySummary};
pub use snapshot::RawSnapshot;
pub use state::{PoolState, RepegState};
