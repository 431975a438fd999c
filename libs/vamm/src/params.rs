//! Curve constants and pool parameters
//!
//! The bounds mirror the on-chain contract. Solver guards and
//! construction-time validation share the same closed ranges, so any pool
//! that validates can be solved. NaN never passes a guard.

use crate::error::{Result, VammError};
use serde::{Deserialize, Serialize};

/// Number of assets in the pool (quote, base)
pub const N_COINS: usize = 2;
pub const N_COINS_F: f64 = N_COINS as f64;

/// Scale applied to A on chain
pub const A_MULTIPLIER: f64 = 10_000.0;
pub const MIN_A: f64 = N_COINS_F * N_COINS_F * A_MULTIPLIER / 10.0;
pub const MAX_A: f64 = N_COINS_F * N_COINS_F * A_MULTIPLIER * 100_000.0;

pub const MIN_GAMMA: f64 = 1e-8;
pub const MAX_GAMMA: f64 = 2e-2;

pub const MIN_D: f64 = 0.1;
pub const MAX_D: f64 = 1e15;

/// One unit of the 18-decimal on-chain representation
pub const WEI: f64 = 1e-18;

/// Newton iteration ceiling shared by both solvers
pub const MAX_ITERATIONS: usize = 255;

/// `lo <= value <= hi`, false for NaN
pub(crate) fn within(value: f64, lo: f64, hi: f64) -> bool {
    (lo..=hi).contains(&value)
}

pub(crate) fn check_a(a: f64) -> Result<()> {
    if !within(a, MIN_A, MAX_A) {
        return Err(VammError::UnsafeParameter { name: "A", value: a });
    }
    Ok(())
}

pub(crate) fn check_gamma(gamma: f64) -> Result<()> {
    if !within(gamma, MIN_GAMMA, MAX_GAMMA) {
        return Err(VammError::UnsafeParameter {
            name: "gamma",
            value: gamma,
        });
    }
    Ok(())
}

pub(crate) fn check_d(d: f64) -> Result<()> {
    if !within(d, MIN_D, MAX_D) {
        return Err(VammError::UnsafeParameter { name: "D", value: d });
    }
    Ok(())
}

/// Construction-time curve constants of a pool instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveParams {
    /// Amplification, already multiplied by `N^N * A_MULTIPLIER`
    pub a: f64,
    pub gamma: f64,
    /// Constant linear fee rate (0.0005 = 5 bps)
    pub mid_fee: f64,
}

impl Default for CurveParams {
    fn default() -> Self {
        Self {
            a: 400_000.0,
            gamma: 0.000145,
            mid_fee: 0.0005,
        }
    }
}

impl CurveParams {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_A..=MAX_A).contains(&self.a) {
            return Err(VammError::InvalidParameter(format!(
                "A={} outside [{}, {}]",
                self.a, MIN_A, MAX_A
            )));
        }
        if !(MIN_GAMMA..=MAX_GAMMA).contains(&self.gamma) {
            return Err(VammError::InvalidParameter(format!(
                "gamma={} outside [{}, {}]",
                self.gamma, MIN_GAMMA, MAX_GAMMA
            )));
        }
        if !(0.0..1.0).contains(&self.mid_fee) {
            return Err(VammError::InvalidParameter(format!(
                "mid_fee={} outside [0, 1)",
                self.mid_fee
            )));
        }
        Ok(())
    }
}

/// Repeg and EMA tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleParams {
    /// EMA half-life in seconds
    pub ma_half_time: f64,
    /// Minimum relative price_scale move per repeg
    pub adjustment_step: f64,
    /// Profit cushion that must be exceeded before a repeg is attempted
    pub allowed_extra_profit: f64,
    /// Clock advance applied to each executed trade
    pub trade_interval_secs: i64,
}

impl Default for OracleParams {
    fn default() -> Self {
        Self {
            ma_half_time: 600.0,
            adjustment_step: 0.000146,
            allowed_extra_profit: 0.000002,
            trade_interval_secs: 3,
        }
    }
}

impl OracleParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.ma_half_time > 0.0) {
            return Err(VammError::InvalidParameter(format!(
                "ma_half_time={} must be positive",
                self.ma_half_time
            )));
        }
        if self.adjustment_step < 0.0 || self.allowed_extra_profit < 0.0 {
            return Err(VammError::InvalidParameter(
                "adjustment_step and allowed_extra_profit must be non-negative".to_string(),
            ));
        }
        if self.trade_interval_secs < 0 {
            return Err(VammError::InvalidParameter(format!(
                "trade_interval_secs={} must be non-negative",
                self.trade_interval_secs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_constants() {
        assert_eq!(MIN_A, 4_000.0);
        assert_eq!(MAX_A, 4_000_000_000.0);
    }

    #[test]
    fn test_default_params_valid() {
        assert!(CurveParams::default().validate().is_ok());
        assert!(OracleParams::default().validate().is_ok());
    }

    #[test]
    fn test_curve_params_rejected() {
        let params = CurveParams {
            gamma: 0.05,
            ..CurveParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(VammError::InvalidParameter(_))
        ));

        let params = CurveParams {
            a: 100.0,
            ..CurveParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_solver_guards() {
        assert!(check_a(400_000.0).is_ok());
        assert!(check_a(MIN_A - 1.0).is_err());
        assert!(check_gamma(0.0).is_err());
        assert!(check_d(0.05).is_err());
        assert!(check_d(2e6).is_ok());
        assert!(check_d(f64::NAN).is_err());
        assert!(check_gamma(f64::NAN).is_err());
    }

    #[test]
    fn test_solver_guards_accept_validated_bounds() {
        for gamma in [MIN_GAMMA, MAX_GAMMA] {
            let params = CurveParams {
                gamma,
                ..CurveParams::default()
            };
            assert!(params.validate().is_ok());
            assert!(check_gamma(gamma).is_ok(), "gamma={}", gamma);
        }
        assert!(check_a(MIN_A).is_ok());
        assert!(check_a(MAX_A).is_ok());
        assert!(check_d(MIN_D).is_ok());
        assert!(check_d(MAX_D).is_ok());
        assert!(check_gamma(MAX_GAMMA * 1.0001).is_err());
        assert!(check_d(MAX_D * 1.0001).is_err());
    }
}
