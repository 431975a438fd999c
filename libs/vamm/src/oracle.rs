//! Price oracle tracking and repegging
//!
//! After every balance change the pool refreshes its EMA oracle, its
//! invariant and its profit counters, then decides whether to move
//! `price_scale` toward the oracle. A move is only committed if the pool
//! keeps at least half of its accrued profit afterwards.

use crate::balance::solve_y;
use crate::error::{Result, VammError};
use crate::invariant::{geometric_mean, solve_d};
use crate::params::{check_d, CurveParams, N_COINS_F};
use crate::state::{PoolState, RepegState};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// What `tweak_price` did to `price_scale`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RepegOutcome {
    /// No repeg attempted
    Unchanged,
    /// Candidate committed
    Repegged { from: f64, to: f64 },
    /// Candidate computed but rejected for insufficient profit
    Discarded { candidate: f64 },
}

/// 0.5^power
fn halfpow(power: f64) -> f64 {
    0.5_f64.powf(power)
}

/// Virtual price of a pool holding invariant `d` at `price_scale`
fn virtual_price_at(d: f64, price_scale: f64, total_supply: f64) -> f64 {
    let xp = [d / N_COINS_F, d / (N_COINS_F * price_scale)];
    geometric_mean(xp) / total_supply
}

/// Marginal price from a tiny quote-side probe trade against `d`
fn implied_price(params: &CurveParams, xp: [f64; 2], d: f64, price_scale: f64) -> Result<f64> {
    let dx_price = xp[0] / 1e6;
    let probe = [xp[0] + dx_price, xp[1]];
    let y = solve_y(params.a, params.gamma, probe, d, 1)?;
    Ok(price_scale * dx_price / (xp[1] - y))
}

/// Post-trade oracle, invariant and repeg update
///
/// `trade_price` is the realized price of the trade that just happened, if
/// any; `new_d` is an invariant the caller already knows. The state is only
/// written when the whole update succeeds.
pub fn tweak_price(
    state: &mut PoolState,
    params: &CurveParams,
    trade_price: Option<f64>,
    new_d: Option<f64>,
    timestamp: i64,
) -> Result<RepegOutcome> {
    let mut next = state.clone();
    let price_scale = next.price_scale;
    let xp = next.xp();

    if next.last_prices_timestamp < timestamp {
        let elapsed = (timestamp - next.last_prices_timestamp) as f64;
        let alpha = halfpow(elapsed / next.ma_half_time);
        next.price_oracle = next.last_prices * (1.0 - alpha) + next.price_oracle * alpha;
        next.last_prices_timestamp = timestamp;
    }
    let price_oracle = next.price_oracle;

    let d_unadjusted = match new_d {
        Some(d) => {
            check_d(d)?;
            d
        }
        None => solve_d(params.a, params.gamma, xp)?,
    };

    next.last_prices = match trade_price {
        Some(p) if p > 0.0 => p,
        _ => implied_price(params, xp, d_unadjusted, price_scale)?,
    };

    let old_xcp_profit = next.xcp_profit;
    let old_virtual_price = next.virtual_price;

    let mut xcp_profit = 1.0;
    let mut virtual_price = 1.0;
    if old_virtual_price > 0.0 {
        virtual_price = virtual_price_at(d_unadjusted, price_scale, next.total_supply);
        xcp_profit = old_xcp_profit * virtual_price / old_virtual_price;
        if virtual_price < old_virtual_price {
            error!(
                previous = old_virtual_price,
                current = virtual_price,
                "virtual price decreased"
            );
            return Err(VammError::LossDetected {
                previous: old_virtual_price,
                current: virtual_price,
            });
        }
    }
    next.xcp_profit = xcp_profit;

    let norm = (price_oracle / price_scale - 1.0).abs();
    let adjustment_step = next.adjustment_step.max(norm / 10.0);

    if !next.not_adjusted.is_pending()
        && virtual_price * 2.0 - 1.0 > xcp_profit + 2.0 * next.allowed_extra_profit
        && norm > adjustment_step
        && old_virtual_price > 0.0
    {
        next.not_adjusted = RepegState::PendingRepeg;
    }

    let outcome = if next.not_adjusted.is_pending() && norm > adjustment_step && old_virtual_price > 0.0 {
        let p_new =
            (price_scale * (norm - adjustment_step) + adjustment_step * price_oracle) / norm;

        let xp_new = [xp[0], xp[1] * p_new / price_scale];
        let d = solve_d(params.a, params.gamma, xp_new)?;
        let candidate_virtual_price = virtual_price_at(d, p_new, next.total_supply);

        if candidate_virtual_price > 1.0 && 2.0 * candidate_virtual_price - 1.0 > xcp_profit {
            info!(
                from = price_scale,
                to = p_new,
                virtual_price = candidate_virtual_price,
                "price_scale repegged"
            );
            next.price_scale = p_new;
            next.d = d;
            next.virtual_price = candidate_virtual_price;
            RepegOutcome::Repegged {
                from: price_scale,
                to: p_new,
            }
        } else {
            debug!(
                candidate = p_new,
                virtual_price = candidate_virtual_price,
                xcp_profit,
                "repeg candidate discarded"
            );
            next.not_adjusted = RepegState::Adjusted;
            next.d = d_unadjusted;
            next.virtual_price = virtual_price;
            RepegOutcome::Discarded { candidate: p_new }
        }
    } else {
        next.d = d_unadjusted;
        next.virtual_price = virtual_price;
        // Oracle came back within one step while latched
        next.not_adjusted = RepegState::Adjusted;
        RepegOutcome::Unchanged
    };

    *state = next;
    Ok(outcome)
}
