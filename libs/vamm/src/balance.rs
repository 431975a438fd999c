//! Balance solver
//!
//! Given `D` and one price-scaled balance, solves the invariant for the
//! complementary balance with Newton steps on the single unknown `y`.
//! When a step would push the quadratic term negative the previous estimate
//! is halved instead, which recovers from overshoot without failing.

use crate::error::{MathError, VammError};
use crate::params::{
    check_a, check_d, check_gamma, within, A_MULTIPLIER, MAX_ITERATIONS, N_COINS, N_COINS_F, WEI,
};
use tracing::{trace, warn};

/// Solve for `x[i]` keeping `x[1 - i]` and `D` fixed
pub fn solve_y(a: f64, gamma: f64, x: [f64; 2], d: f64, i: usize) -> Result<f64, MathError> {
    if i >= N_COINS {
        return Err(VammError::IndexOutOfRange { index: i });
    }
    check_a(a)?;
    check_gamma(gamma)?;
    check_d(d)?;

    let xj = x[1 - i];
    let k0_i = N_COINS_F * xj / d;
    if !within(k0_i, 1e-2 * N_COINS_F, 1e2 * N_COINS_F) {
        return Err(VammError::UnsafeParameter {
            name: "k0_i",
            value: k0_i,
        });
    }

    let y0 = d * d / (xj * N_COINS_F * N_COINS_F);
    solve_y_from(a, gamma, x, d, i, y0)
}

/// Newton iteration for `x[i]` from the starting estimate `y0`; inputs are
/// assumed to have passed the guards in [`solve_y`]
pub(crate) fn solve_y_from(
    a: f64,
    gamma: f64,
    x: [f64; 2],
    d: f64,
    i: usize,
    y0: f64,
) -> Result<f64, MathError> {
    let xj = x[1 - i];
    let k0_i = N_COINS_F * xj / d;
    let mut y = y0;
    let convergence_limit = xj.max(d).max(0.01);

    for iteration in 0..MAX_ITERATIONS {
        let y_prev = y;

        let k0 = k0_i * y * N_COINS_F / d;
        let s = xj + y;
        let g1k0 = (gamma + 1.0 - k0).abs() + WEI;

        let mul1 = (d / gamma) * (g1k0 / gamma) * g1k0 * A_MULTIPLIER / a;
        let mul2 = 1.0 + 2.0 * k0 / g1k0;

        let mut yfprime = y + s * mul2 + mul1;
        let dyfprime = d * mul2;
        if yfprime < dyfprime {
            y = y_prev / 2.0;
            continue;
        }
        yfprime -= dyfprime;

        let fprime = yfprime / y;
        let mut y_minus = mul1 / fprime;
        let y_plus = (yfprime + d) / fprime + y_minus / k0;
        y_minus += s / fprime;

        y = if y_plus < y_minus {
            y_prev / 2.0
        } else {
            y_plus - y_minus
        };

        let diff = (y - y_prev).abs();
        if diff * 1e14 < convergence_limit.max(y) {
            let frac = y / d;
            if !within(frac, 1e-2, 1e2) {
                return Err(VammError::UnsafeIntermediateValue {
                    name: "y/D",
                    value: frac,
                });
            }
            trace!(iterations = iteration + 1, y, "solve_y converged");
            return Ok(y);
        }
    }

    warn!(?x, d, i, "solve_y did not converge");
    Err(VammError::DidNotConverge { solver: "solve_y" })
}
