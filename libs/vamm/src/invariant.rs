//! Invariant solver
//!
//! Solves the two-coin crypto invariant for `D` given price-scaled balances:
//!
//! ```text
//! K0 = 4·x0·x1 / D²
//! K  = A·K0·gamma² / (gamma + 1 - K0)²
//! K·D·(x0 + x1) + x0·x1 = K·D² + (D/2)²
//! ```
//!
//! Newton-Raphson with the contract's split `D_plus - D_minus` update so every
//! intermediate stays positive.

use crate::error::{MathError, VammError};
use crate::params::{
    check_a, check_gamma, within, A_MULTIPLIER, MAX_ITERATIONS, N_COINS_F, WEI,
};
use tracing::{trace, warn};

/// sqrt(x0 · x1)
pub fn geometric_mean(x: [f64; 2]) -> f64 {
    (x[0] * x[1]).sqrt()
}

/// Solve for the invariant `D` of two price-scaled balances
pub fn solve_d(a: f64, gamma: f64, balances: [f64; 2]) -> Result<f64, MathError> {
    solve_d_bounded(a, gamma, balances, MAX_ITERATIONS)
}

/// `solve_d` with an explicit Newton step budget
pub(crate) fn solve_d_bounded(
    a: f64,
    gamma: f64,
    balances: [f64; 2],
    max_iterations: usize,
) -> Result<f64, MathError> {
    check_a(a)?;
    check_gamma(gamma)?;

    let mut x = balances;
    if x[0] < x[1] {
        x.swap(0, 1);
    }

    if !within(x[0], 1e-9, 1e15) {
        return Err(VammError::UnsafeParameter {
            name: "x[0]",
            value: x[0],
        });
    }
    if !(x[1] / x[0] >= 1e-4) {
        return Err(VammError::UnsafeParameter {
            name: "x[1]",
            value: x[1],
        });
    }

    let mut d = N_COINS_F * geometric_mean(x);
    let s = x[0] + x[1];

    for iteration in 0..max_iterations {
        let d_prev = d;

        let k0 = x[0] * x[1] * N_COINS_F * N_COINS_F / (d * d);
        let g1k0 = (gamma + 1.0 - k0).abs() + WEI;

        let mul1 = (d / gamma) * (g1k0 / gamma) * g1k0 * A_MULTIPLIER / a;
        let mul2 = 2.0 * N_COINS_F * k0 / g1k0;
        let neg_fprime = (s + s * mul2) + mul1 * N_COINS_F / k0 - mul2 * d;

        let d_plus = d * (neg_fprime + s) / neg_fprime;
        let mut d_minus = d * d / neg_fprime;
        d_minus -= d * (mul1 / neg_fprime) * (k0 - 1.0) / k0;

        d = if d_plus > d_minus {
            d_plus - d_minus
        } else {
            (d_minus - d_plus) / 2.0
        };

        let diff = (d - d_prev).abs();
        if diff * 1e14 < d.max(1e-2) {
            for xi in x {
                let frac = xi / d;
                if !within(frac, 1e-2, 1e2) {
                    return Err(VammError::UnsafeIntermediateValue {
                        name: "x/D",
                        value: frac,
                    });
                }
            }
            trace!(iterations = iteration + 1, d, "solve_d converged");
            return Ok(d);
        }
    }

    warn!(?balances, a, gamma, "solve_d did not converge");
    Err(VammError::DidNotConverge { solver: "solve_d" })
}

/// Invariant from native balances: asset1 is scaled by `price_scale` first
pub fn get_d(a: f64, gamma: f64, balances: [f64; 2], price_scale: f64) -> Result<f64, MathError> {
    solve_d(a, gamma, [balances[0], balances[1] * price_scale])
}
