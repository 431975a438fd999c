//! Pool façade
//!
//! Owns the mutable [`PoolState`] and orchestrates quoting, trade execution
//! and position valuation. Trades mutate a working copy that is committed
//! only after the oracle update succeeds, so a rejected trade leaves the
//! pool exactly as it was.

use crate::error::{Result, VammError};
use crate::invariant::{geometric_mean, solve_d};
use crate::oracle::{tweak_price, RepegOutcome};
use crate::params::{CurveParams, OracleParams, N_COINS_F};
use crate::position::{self, MakerPosition, TakerPosition};
use crate::quote::{calc_mark_price, get_dx, get_dy, TradeQuote};
use crate::state::{PoolState, RepegState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Result of an executed trade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    /// Quote received on a short, quote paid on a long
    pub amount: f64,
    pub fee: f64,
    /// Realized average price in quote per base
    pub price: f64,
    pub mark_price: f64,
    pub repeg: RepegOutcome,
}

/// In-memory mirror of one two-asset pool
#[derive(Debug, Clone)]
pub struct Pool {
    params: CurveParams,
    oracle: OracleParams,
    state: PoolState,
}

impl Pool {
    /// Wrap an existing state, typically decoded from a chain snapshot
    pub fn new(params: CurveParams, oracle: OracleParams, state: PoolState) -> Result<Self> {
        params.validate()?;
        oracle.validate()?;
        validate_state(&state)?;
        Ok(Self {
            params,
            oracle,
            state,
        })
    }

    /// Seed a fresh pool the way an initial deposit does: virtual price and
    /// profit start at 1 and the LP supply equals the pool's xcp
    pub fn bootstrap(
        params: CurveParams,
        oracle: OracleParams,
        balances: [f64; 2],
        price_scale: f64,
        timestamp: i64,
    ) -> Result<Self> {
        params.validate()?;
        let d = solve_d(
            params.a,
            params.gamma,
            [balances[0], balances[1] * price_scale],
        )?;
        let total_supply = geometric_mean([d / N_COINS_F, d / (N_COINS_F * price_scale)]);

        let state = PoolState {
            balances,
            d,
            price_scale,
            price_oracle: price_scale,
            last_prices: price_scale,
            last_prices_timestamp: timestamp,
            ma_half_time: oracle.ma_half_time,
            total_supply,
            xcp_profit: 1.0,
            virtual_price: 1.0,
            adjustment_step: oracle.adjustment_step,
            allowed_extra_profit: oracle.allowed_extra_profit,
            not_adjusted: RepegState::Adjusted,
        };
        info!(?balances, price_scale, d, "bootstrapped pool");
        Self::new(params, oracle, state)
    }

    pub fn balances(&self) -> [f64; 2] {
        self.state.balances
    }

    /// Read-only copy of the current state
    pub fn snapshot(&self) -> PoolState {
        self.state.clone()
    }

    pub fn mark_price(&self) -> f64 {
        let xp = self.state.xp();
        calc_mark_price(
            xp[0],
            xp[1],
            self.params.a,
            self.params.gamma,
            self.state.d,
            self.state.price_scale,
        )
    }

    /// Quote received for selling `size` base
    pub fn quote_short(&self, size: f64) -> Result<TradeQuote> {
        get_dy(
            1,
            0,
            size,
            self.state.balances,
            self.state.d,
            self.state.price_scale,
            &self.params,
        )
    }

    /// Quote required to buy `size` base
    pub fn quote_long(&self, size: f64) -> Result<TradeQuote> {
        get_dx(
            0,
            1,
            size,
            self.state.balances,
            self.state.d,
            self.state.price_scale,
            &self.params,
        )
    }

    fn next_timestamp(&self) -> i64 {
        self.state.last_prices_timestamp + self.oracle.trade_interval_secs
    }

    /// Sell `size` base for at least `min_output` quote
    pub fn execute_short(&mut self, size: f64, min_output: f64) -> Result<Execution> {
        self.execute_short_at(size, min_output, self.next_timestamp())
    }

    /// Buy `size` base for at most `max_input` quote
    pub fn execute_long(&mut self, size: f64, max_input: f64) -> Result<Execution> {
        self.execute_long_at(size, max_input, self.next_timestamp())
    }

    pub fn execute_short_at(
        &mut self,
        size: f64,
        min_output: f64,
        timestamp: i64,
    ) -> Result<Execution> {
        let quote = self.quote_short(size)?;
        if quote.amount < min_output {
            return Err(VammError::SlippageExceeded {
                realized: quote.amount,
                limit: min_output,
            });
        }

        let mut next = self.state.clone();
        next.balances[1] += size;
        next.balances[0] -= quote.amount;
        let price = quote.amount / size;
        self.commit(next, quote, price, timestamp)
    }

    pub fn execute_long_at(
        &mut self,
        size: f64,
        max_input: f64,
        timestamp: i64,
    ) -> Result<Execution> {
        let quote = self.quote_long(size)?;
        if quote.amount > max_input {
            return Err(VammError::SlippageExceeded {
                realized: quote.amount,
                limit: max_input,
            });
        }

        let mut next = self.state.clone();
        next.balances[0] += quote.amount;
        next.balances[1] -= size;
        let price = quote.amount / size;
        self.commit(next, quote, price, timestamp)
    }

    fn commit(
        &mut self,
        mut next: PoolState,
        quote: TradeQuote,
        price: f64,
        timestamp: i64,
    ) -> Result<Execution> {
        let repeg = tweak_price(&mut next, &self.params, Some(price), None, timestamp)?;
        self.state = next;

        let execution = Execution {
            amount: quote.amount,
            fee: quote.fee,
            price,
            mark_price: self.mark_price(),
            repeg,
        };
        debug!(?execution, "trade executed");
        Ok(execution)
    }

    /// Run the oracle update without a trade, e.g. after a liquidity change
    pub fn tweak_price(
        &mut self,
        trade_price: Option<f64>,
        new_d: Option<f64>,
        timestamp: i64,
    ) -> Result<RepegOutcome> {
        tweak_price(&mut self.state, &self.params, trade_price, new_d, timestamp)
    }

    /// Implied position of a maker holding `amount` of `mint_dtoken` dTokens
    /// minted against `vusd` quote and `vasset` base
    pub fn maker_position(
        &self,
        amount: f64,
        vusd: f64,
        vasset: f64,
        mint_dtoken: f64,
    ) -> Result<MakerPosition> {
        position::maker_position(&self.state, &self.params, amount, vusd, vasset, mint_dtoken)
    }

    /// Closing notional and unrealized PnL of a taker position
    pub fn taker_pnl(&self, position: f64, open_notional: f64) -> Result<TakerPosition> {
        position::taker_notional_and_pnl(
            position,
            open_notional,
            self.state.balances,
            self.state.d,
            self.state.price_scale,
            &self.params,
        )
    }
}

fn validate_state(state: &PoolState) -> Result<()> {
    let positive = [
        ("balances[0]", state.balances[0]),
        ("balances[1]", state.balances[1]),
        ("D", state.d),
        ("price_scale", state.price_scale),
        ("total_supply", state.total_supply),
        ("ma_half_time", state.ma_half_time),
    ];
    for (name, value) in positive {
        if !(value > 0.0) || !value.is_finite() {
            return Err(VammError::InvalidSnapshot(format!(
                "{} must be positive and finite, got {}",
                name, value
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: i64 = 1_700_000_000;

    fn pool() -> Pool {
        Pool::bootstrap(
            CurveParams::default(),
            OracleParams::default(),
            [1_000_000.0, 1_000.0],
            1_000.0,
            START,
        )
        .unwrap()
    }

    #[test]
    fn test_bootstrap() {
        let pool = pool();
        let state = pool.snapshot();
        assert!((state.d - 2_000_000.0).abs() < 1e-6);
        assert_eq!(state.virtual_price, 1.0);
        assert!((pool.mark_price() - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_gamma_at_validated_bounds_trades() {
        use crate::params::{MAX_GAMMA, MIN_GAMMA};

        for gamma in [MIN_GAMMA, MAX_GAMMA] {
            let params = CurveParams {
                gamma,
                ..CurveParams::default()
            };
            let mut pool = Pool::bootstrap(
                params,
                OracleParams::default(),
                [1_000_000.0, 1_000.0],
                1_000.0,
                START,
            )
            .unwrap();
            let exec = pool.execute_long(5.0, f64::MAX).unwrap();
            assert!(exec.amount > 5_000.0, "gamma={} paid {}", gamma, exec.amount);
            assert!(pool.quote_short(5.0).is_ok());
        }
    }

    #[test]
    fn test_slippage_leaves_pool_untouched() {
        let mut pool = pool();
        let before = pool.snapshot();

        let err = pool.execute_long(5.0, 5_000.0).unwrap_err();
        assert!(matches!(err, VammError::SlippageExceeded { .. }));
        assert!(!err.is_fatal());

        let err = pool.execute_short(5.0, 5_000.0).unwrap_err();
        assert!(matches!(err, VammError::SlippageExceeded { .. }));
        assert_eq!(pool.snapshot(), before);
    }

    #[test]
    fn test_execute_short_moves_balances() {
        let mut pool = pool();
        let quote = pool.quote_short(5.0).unwrap();
        let exec = pool.execute_short(5.0, 0.0).unwrap();

        assert_eq!(exec.amount, quote.amount);
        let state = pool.snapshot();
        assert_eq!(state.balances[1], 1_005.0);
        assert!((state.balances[0] - (1_000_000.0 - exec.amount)).abs() < 1e-9);
        assert_eq!(state.last_prices, exec.price);
        assert_eq!(state.last_prices_timestamp, START + 3);
        assert!(pool.mark_price() < 1_000.0);
        assert!(state.virtual_price > 1.0);
    }

    #[test]
    fn test_explicit_timestamp() {
        let mut pool = pool();
        pool.execute_long_at(1.0, f64::MAX, START + 60).unwrap();
        assert_eq!(pool.snapshot().last_prices_timestamp, START + 60);
    }

    #[test]
    fn test_rejects_invalid_state() {
        let mut state = pool().snapshot();
        state.total_supply = 0.0;
        assert!(matches!(
            Pool::new(CurveParams::default(), OracleParams::default(), state),
            Err(VammError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_taker_pnl_uses_current_pool() {
        let pool = pool();
        let taker = pool.taker_pnl(-5.0, 5_100.0).unwrap();
        assert_eq!(taker.notional, pool.quote_long(5.0).unwrap().amount);
    }
}
