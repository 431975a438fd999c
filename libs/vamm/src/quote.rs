//! Swap quoting and mark price
//!
//! Balances are native: index 0 is the quote asset, index 1 the base asset in
//! its own units. Everything is converted to price-scaled space (`xp`) before
//! touching the solvers and converted back for the amounts returned.

use crate::balance::solve_y;
use crate::error::{Result, VammError};
use crate::invariant::solve_d;
use crate::params::{CurveParams, A_MULTIPLIER, N_COINS, WEI};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Transient result of a quote: the traded amount, the fee inside it and
/// the mark price the pool would show after the trade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeQuote {
    pub amount: f64,
    pub fee: f64,
    pub mark_price: f64,
}

fn check_pair(i: usize, j: usize, amount: f64) -> Result<()> {
    if i == j {
        return Err(VammError::SameAsset);
    }
    if i >= N_COINS {
        return Err(VammError::IndexOutOfRange { index: i });
    }
    if j >= N_COINS {
        return Err(VammError::IndexOutOfRange { index: j });
    }
    if !(amount > 0.0) {
        return Err(VammError::NonPositiveAmount { amount });
    }
    Ok(())
}

fn scaled(balances: [f64; 2], price_scale: f64) -> [f64; 2] {
    [balances[0], balances[1] * price_scale]
}

/// Mark price of the pool after moving to `post_balances` (native units)
fn post_trade_mark_price(
    post_balances: [f64; 2],
    price_scale: f64,
    params: &CurveParams,
) -> Result<f64> {
    let xp = scaled(post_balances, price_scale);
    let d_new = solve_d(params.a, params.gamma, xp)?;
    Ok(calc_mark_price(
        xp[0],
        xp[1],
        params.a,
        params.gamma,
        d_new,
        price_scale,
    ))
}

/// Output amount of coin `j` for `dx` of coin `i`, fee deducted from output
pub fn get_dy(
    i: usize,
    j: usize,
    dx: f64,
    balances: [f64; 2],
    d: f64,
    price_scale: f64,
    params: &CurveParams,
) -> Result<TradeQuote> {
    check_pair(i, j, dx)?;

    let mut native = balances;
    native[i] += dx;
    let xp = scaled(native, price_scale);

    let y = solve_y(params.a, params.gamma, xp, d, j)?;
    let mut dy = xp[j] - y - WEI;
    if j > 0 {
        dy /= price_scale;
    }

    let fee = params.mid_fee * dy;
    dy -= fee;

    native[j] -= dy;
    let mark_price = post_trade_mark_price(native, price_scale, params)?;

    debug!(i, j, dx, dy, fee, mark_price, "get_dy");
    Ok(TradeQuote {
        amount: dy,
        fee,
        mark_price,
    })
}

/// Input amount of coin `i` needed to receive `dy` of coin `j`, fee added
/// on top of the raw requirement
pub fn get_dx(
    i: usize,
    j: usize,
    dy: f64,
    balances: [f64; 2],
    d: f64,
    price_scale: f64,
    params: &CurveParams,
) -> Result<TradeQuote> {
    check_pair(i, j, dy)?;

    let mut native = balances;
    native[j] -= dy;
    let xp = scaled(native, price_scale);

    let x = solve_y(params.a, params.gamma, xp, d, i)?;
    let mut dx = x - xp[i] + WEI;
    if i > 0 {
        dx /= price_scale;
    }

    let fee = params.mid_fee * dx;
    dx += fee;

    native[i] += dx;
    let mark_price = post_trade_mark_price(native, price_scale, params)?;

    debug!(i, j, dy, dx, fee, mark_price, "get_dx");
    Ok(TradeQuote {
        amount: dx,
        fee,
        mark_price,
    })
}

/// Instantaneous price of the base asset in quote units
///
/// Implicit-function derivative `dy/dx` of the invariant surface at
/// price-scaled balances `(x, y)`, converted back through `price_scale`.
pub fn calc_mark_price(x: f64, y: f64, a: f64, gamma: f64, d: f64, price_scale: f64) -> f64 {
    let d_square = d * d;
    let k0 = 4.0 * x * y / d_square;
    let g1k0 = gamma + 1.0 - k0;
    let g1k = (a * gamma * gamma) / (g1k0 * g1k0) / A_MULTIPLIER;
    let k = g1k * k0;
    let p = g1k * (1.0 + 2.0 * k0 / g1k0);
    let q = 4.0 * x / d_square;
    let r = 4.0 * y / d_square;

    let g2k = d * (x + y) - d_square;
    let numerator = y + p * r * g2k + k * d;
    let denominator = p * q * g2k + k * d + x;

    let y_prime = -numerator / denominator;
    (price_scale / y_prime).abs()
}
