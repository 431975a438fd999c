//! Pool trait definitions for quote-driven strategies

use crate::{Pool, Result, TradeQuote};

/// Read-only quoting interface used by trade sizing
pub trait QuotingPool {
    /// Quote paid to buy `size` base
    fn quote_long(&self, size: f64) -> Result<TradeQuote>;

    /// Quote received for selling `size` base
    fn quote_short(&self, size: f64) -> Result<TradeQuote>;

    /// Current instantaneous price
    fn mark_price(&self) -> f64;

    /// Quote and base reserves
    fn reserves(&self) -> [f64; 2];
}

impl QuotingPool for Pool {
    fn quote_long(&self, size: f64) -> Result<TradeQuote> {
        Pool::quote_long(self, size)
    }

    fn quote_short(&self, size: f64) -> Result<TradeQuote> {
        Pool::quote_short(self, size)
    }

    fn mark_price(&self) -> f64 {
        Pool::mark_price(self)
    }

    fn reserves(&self) -> [f64; 2] {
        self.balances()
    }
}
