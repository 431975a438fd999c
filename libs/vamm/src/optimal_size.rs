//! Trade sizing against a target price
//!
//! Finds the base size that pushes the mark price of a pool across a target
//! by walking the size up in fixed increments and quoting each candidate.
//! The walk is deliberately coarse: simulations only need the first lot size
//! that reaches the target, not the exact crossing point.

use crate::error::{Result, VammError};
use crate::pool_traits::QuotingPool;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for trade sizing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Base increment per search step
    pub unit_trade: f64,
    /// Steps before the search gives up
    pub max_steps: usize,
    /// Fraction the predicted mark price may pass the target by
    pub overshoot_tolerance: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            unit_trade: 5.0,
            max_steps: 1_000,
            overshoot_tolerance: 0.05, // 5% past target
        }
    }
}

impl SizingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.unit_trade > 0.0) || !self.unit_trade.is_finite() {
            return Err(VammError::InvalidParameter(format!(
                "unit_trade must be positive, got {}",
                self.unit_trade
            )));
        }
        if self.max_steps == 0 {
            return Err(VammError::InvalidParameter(
                "max_steps must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.overshoot_tolerance) {
            return Err(VammError::InvalidParameter(format!(
                "overshoot_tolerance must be in [0, 1), got {}",
                self.overshoot_tolerance
            )));
        }
        Ok(())
    }
}

/// Calculates trade sizes that move a pool to a target price
#[derive(Debug, Clone, Default)]
pub struct OptimalSizeCalculator {
    config: SizingConfig,
}

impl OptimalSizeCalculator {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    /// Signed base size that moves the mark price to `target`
    ///
    /// Positive sizes are longs, negative sizes are shorts and zero means
    /// the pool already sits at the target.
    pub fn size_to_target<P: QuotingPool + ?Sized>(&self, pool: &P, target: f64) -> Result<f64> {
        if !(target > 0.0) || !target.is_finite() {
            return Err(VammError::NonPositiveAmount { amount: target });
        }

        let mark_price = pool.mark_price();
        if mark_price < target {
            let ceiling = target * (1.0 + self.config.overshoot_tolerance);
            let available = pool.reserves()[1];
            self.walk(target, |size| {
                if size >= available {
                    return Err(VammError::InsufficientLiquidity {
                        requested: size,
                        available,
                    });
                }
                let predicted = pool.quote_long(size)?.mark_price;
                if predicted > ceiling {
                    return Err(VammError::TargetOvershoot {
                        mark_price: predicted,
                        target,
                    });
                }
                Ok(predicted >= target)
            })
        } else if mark_price > target {
            let floor = target * (1.0 - self.config.overshoot_tolerance);
            let size = self.walk(target, |size| {
                let predicted = pool.quote_short(size)?.mark_price;
                if predicted < floor {
                    return Err(VammError::TargetOvershoot {
                        mark_price: predicted,
                        target,
                    });
                }
                Ok(predicted <= target)
            })?;
            Ok(-size)
        } else {
            Ok(0.0)
        }
    }

    /// Step the size up until `reached` reports the target crossed
    fn walk<F>(&self, target: f64, mut reached: F) -> Result<f64>
    where
        F: FnMut(f64) -> Result<bool>,
    {
        let mut size = 0.0;
        for _ in 0..self.config.max_steps {
            size += self.config.unit_trade;
            if reached(size)? {
                debug!(size, target, "trade size found");
                return Ok(size);
            }
        }
        Err(VammError::SizeSearchExhausted {
            steps: self.config.max_steps,
            size,
        })
    }

    /// Quote notional needed to move the mark price by `band` either way
    ///
    /// Averages the long and short sizes and values them at the current
    /// mark price.
    pub fn depth<P: QuotingPool + ?Sized>(&self, pool: &P, band: f64) -> Result<f64> {
        if !(band > 0.0) || band >= 1.0 {
            return Err(VammError::InvalidParameter(format!(
                "depth band must be in (0, 1), got {}",
                band
            )));
        }
        let mark_price = pool.mark_price();
        let up = self.size_to_target(pool, mark_price * (1.0 + band))?;
        let down = self.size_to_target(pool, mark_price * (1.0 - band))?;
        Ok(mark_price * (up.abs() + down.abs()) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{CurveParams, OracleParams};
    use crate::pool::Pool;

    fn pool() -> Pool {
        Pool::bootstrap(
            CurveParams::default(),
            OracleParams::default(),
            [1_000_000.0, 1_000.0],
            1_000.0,
            1_700_000_000,
        )
        .unwrap()
    }

    #[test]
    fn test_size_long_reaches_target() {
        let pool = pool();
        let calculator = OptimalSizeCalculator::default();

        let size = calculator.size_to_target(&pool, 1_001.0).unwrap();
        assert_eq!(size, 10.0);
        assert!(pool.quote_long(size).unwrap().mark_price >= 1_001.0);
        assert!(pool.quote_long(size - 5.0).unwrap().mark_price < 1_001.0);
    }

    #[test]
    fn test_size_short_is_negative() {
        let pool = pool();
        let calculator = OptimalSizeCalculator::default();

        let size = calculator.size_to_target(&pool, 990.0).unwrap();
        assert_eq!(size, -20.0);
        assert!(pool.quote_short(20.0).unwrap().mark_price <= 990.0);
    }

    #[test]
    fn test_size_at_target_is_zero() {
        let pool = pool();
        let calculator = OptimalSizeCalculator::default();
        assert_eq!(calculator.size_to_target(&pool, pool.mark_price()).unwrap(), 0.0);
    }

    #[test]
    fn test_overshoot() {
        let pool = pool();
        let calculator = OptimalSizeCalculator::new(SizingConfig {
            unit_trade: 500.0,
            ..SizingConfig::default()
        });

        let err = calculator.size_to_target(&pool, 1_001.0).unwrap_err();
        assert!(matches!(err, VammError::TargetOvershoot { target, .. } if target == 1_001.0));
    }

    #[test]
    fn test_search_exhausted() {
        let pool = pool();
        let calculator = OptimalSizeCalculator::new(SizingConfig {
            max_steps: 2,
            ..SizingConfig::default()
        });

        let err = calculator.size_to_target(&pool, 2_000.0).unwrap_err();
        assert_eq!(
            err,
            VammError::SizeSearchExhausted {
                steps: 2,
                size: 10.0
            }
        );
    }

    #[test]
    fn test_long_walk_stops_at_base_reserve() {
        let pool = pool();
        let calculator = OptimalSizeCalculator::new(SizingConfig {
            unit_trade: 1_000.0,
            ..SizingConfig::default()
        });

        let err = calculator.size_to_target(&pool, 1_001.0).unwrap_err();
        assert_eq!(
            err,
            VammError::InsufficientLiquidity {
                requested: 1_000.0,
                available: 1_000.0
            }
        );
    }

    #[test]
    fn test_depth() {
        let pool = pool();
        let depth = OptimalSizeCalculator::default().depth(&pool, 0.005).unwrap();
        // 15 base either way at a mark of 1000
        assert!((depth - 15_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_config_validation() {
        assert!(SizingConfig::default().validate().is_ok());

        let bad = SizingConfig {
            unit_trade: 0.0,
            ..SizingConfig::default()
        };
        assert!(matches!(bad.validate(), Err(VammError::InvalidParameter(_))));

        let bad = SizingConfig {
            overshoot_tolerance: 1.5,
            ..SizingConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
