//! Mutable pool state mirrored from the on-chain contract

use serde::{Deserialize, Serialize};

/// Repeg hysteresis latch
///
/// `PendingRepeg` is entered once profit clears the allowed cushion while the
/// oracle is far enough from `price_scale`, and stays set across calls until
/// a repeg candidate is rejected or the oracle comes back within one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepegState {
    #[default]
    Adjusted,
    PendingRepeg,
}

impl RepegState {
    pub fn is_pending(&self) -> bool {
        matches!(self, RepegState::PendingRepeg)
    }
}

impl From<bool> for RepegState {
    fn from(not_adjusted: bool) -> Self {
        if not_adjusted {
            RepegState::PendingRepeg
        } else {
            RepegState::Adjusted
        }
    }
}

/// Full state of one pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolState {
    /// Quote reserve, base reserve (base in native units)
    pub balances: [f64; 2],
    /// Invariant in price-scaled space
    pub d: f64,
    pub price_scale: f64,
    pub price_oracle: f64,
    pub last_prices: f64,
    /// Unix seconds of the last EMA update
    pub last_prices_timestamp: i64,
    pub ma_half_time: f64,
    pub total_supply: f64,
    pub xcp_profit: f64,
    pub virtual_price: f64,
    pub adjustment_step: f64,
    pub allowed_extra_profit: f64,
    pub not_adjusted: RepegState,
}

impl PoolState {
    /// Balances with the base asset converted to quote terms
    pub fn xp(&self) -> [f64; 2] {
        [self.balances[0], self.balances[1] * self.price_scale]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeg_state_from_flag() {
        assert_eq!(RepegState::from(true), RepegState::PendingRepeg);
        assert_eq!(RepegState::from(false), RepegState::Adjusted);
        assert!(RepegState::PendingRepeg.is_pending());
        assert!(!RepegState::default().is_pending());
    }
}
