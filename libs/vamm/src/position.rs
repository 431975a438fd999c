//! Maker and taker position accounting
//!
//! A maker's share of the pool is valued as if it were withdrawn: the pro-rata
//! balances minus the basis recorded at mint time give an implied position
//! and open notional, which is then marked against the remaining pool.

use crate::error::{Result, VammError};
use crate::params::{CurveParams, MIN_D};
use crate::quote::{get_dx, get_dy};
use crate::state::PoolState;
use serde::{Deserialize, Serialize};

/// Implied position of a liquidity provider
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MakerPosition {
    /// Base quantity, positive for long
    pub position: f64,
    pub open_notional: f64,
    pub unrealized_pnl: f64,
}

/// Taker valuation against the current curve
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TakerPosition {
    /// Quote amount to close the position
    pub notional: f64,
    pub unrealized_pnl: f64,
}

/// What a maker recorded when minting dTokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MakerBasis {
    pub dtoken: f64,
    /// Quote contributed
    pub vusd: f64,
    /// Base contributed
    pub vasset: f64,
}

impl MakerBasis {
    /// Basis of a maker owning `fraction` of the pool's current liquidity
    pub fn pro_rata(state: &PoolState, fraction: f64) -> Self {
        Self {
            dtoken: state.total_supply * fraction,
            vusd: state.balances[0] * fraction,
            vasset: state.balances[1] * fraction,
        }
    }

    /// Quote value of the deposit at `price`
    pub fn notional(&self, price: f64) -> f64 {
        self.vusd + self.vasset * price
    }
}

/// Maker share before marking to the curve, plus the pool left behind
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MakerShare {
    pub position: f64,
    pub open_notional: f64,
    pub fee_adjusted_pnl: f64,
    pub d: f64,
    pub balances: [f64; 2],
}

/// Realizes open notional that no longer backs a position
///
/// Negative notional is realized in full (profit for a long, loss for a
/// short); positive notional with a flat position is accrued fees.
/// Returns `(realized_pnl, remaining_open_notional)`.
pub fn fee_adjusted_pnl(position: f64, open_notional: f64) -> (f64, f64) {
    if open_notional < 0.0 {
        let pnl = if position > 0.0 {
            -open_notional
        } else if position < 0.0 {
            open_notional
        } else {
            0.0
        };
        (pnl, 0.0)
    } else if open_notional > 0.0 && position == 0.0 {
        (open_notional, 0.0)
    } else {
        (0.0, open_notional)
    }
}

/// Withdraw `amount` dTokens out of `mint_dtoken` minted against the basis
///
/// A zero amount is a flat share whatever the basis.
pub(crate) fn maker_share(
    state: &PoolState,
    amount: f64,
    vusd: f64,
    vasset: f64,
    mint_dtoken: f64,
) -> Result<MakerShare> {
    if !(amount >= 0.0) {
        return Err(VammError::NonPositiveAmount { amount });
    }
    if amount == 0.0 {
        return Ok(MakerShare {
            position: 0.0,
            open_notional: 0.0,
            fee_adjusted_pnl: 0.0,
            d: state.d,
            balances: state.balances,
        });
    }
    if !(mint_dtoken > 0.0) {
        return Err(VammError::NonPositiveAmount {
            amount: mint_dtoken,
        });
    }

    let total_supply = state.total_supply;
    if amount > total_supply {
        return Err(VammError::InsufficientLiquidity {
            requested: amount,
            available: total_supply,
        });
    }
    let mut balances = state.balances;
    let mut d_balances = [0.0; 2];
    for (share, balance) in d_balances.iter_mut().zip(balances.iter_mut()) {
        *share = *balance * amount / total_supply;
        *balance -= *share;
    }
    let d = state.d - state.d * amount / total_supply;

    let mut position = d_balances[1];
    let basis_quote = if amount == mint_dtoken {
        position -= vasset;
        vusd
    } else {
        position -= vasset * amount / mint_dtoken;
        vusd * amount / mint_dtoken
    };

    // Flat position with positive notional comes from fee accumulation
    let open_notional = if position > 0.0 {
        basis_quote - d_balances[0]
    } else {
        d_balances[0] - basis_quote
    };

    let (fee_adjusted_pnl, open_notional) = fee_adjusted_pnl(position, open_notional);
    Ok(MakerShare {
        position,
        open_notional,
        fee_adjusted_pnl,
        d,
        balances,
    })
}

/// Value a taker position by closing it against `balances`/`d`
///
/// A short larger than the base reserve cannot be closed and is reported as
/// [`VammError::InsufficientLiquidity`].
pub fn taker_notional_and_pnl(
    position: f64,
    open_notional: f64,
    balances: [f64; 2],
    d: f64,
    price_scale: f64,
    params: &CurveParams,
) -> Result<TakerPosition> {
    if !(d >= MIN_D) {
        return Ok(TakerPosition::default());
    }

    if position > 0.0 {
        let notional = get_dy(1, 0, position, balances, d, price_scale, params)?.amount;
        Ok(TakerPosition {
            notional,
            unrealized_pnl: notional - open_notional,
        })
    } else if position < 0.0 {
        let size = -position;
        if size > balances[1] {
            return Err(VammError::InsufficientLiquidity {
                requested: size,
                available: balances[1],
            });
        }
        let notional = get_dx(0, 1, size, balances, d, price_scale, params)?.amount;
        Ok(TakerPosition {
            notional,
            unrealized_pnl: open_notional - notional,
        })
    } else {
        Ok(TakerPosition::default())
    }
}

/// Maker share marked to the remaining pool
pub fn maker_position(
    state: &PoolState,
    params: &CurveParams,
    amount: f64,
    vusd: f64,
    vasset: f64,
    mint_dtoken: f64,
) -> Result<MakerPosition> {
    let share = maker_share(state, amount, vusd, vasset, mint_dtoken)?;
    let taker = taker_notional_and_pnl(
        share.position,
        share.open_notional,
        share.balances,
        share.d,
        state.price_scale,
        params,
    )?;

    Ok(MakerPosition {
        position: share.position,
        open_notional: share.open_notional,
        unrealized_pnl: taker.unrealized_pnl + share.fee_adjusted_pnl,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RepegState;

    fn state() -> PoolState {
        PoolState {
            balances: [1_000_000.0, 1_000.0],
            d: 2_000_000.0,
            price_scale: 1_000.0,
            price_oracle: 1_000.0,
            last_prices: 1_000.0,
            last_prices_timestamp: 0,
            ma_half_time: 600.0,
            total_supply: 1_000.0,
            xcp_profit: 1.0,
            virtual_price: 1.0,
            adjustment_step: 0.000146,
            allowed_extra_profit: 0.000002,
            not_adjusted: RepegState::Adjusted,
        }
    }

    #[test]
    fn test_fee_adjusted_pnl_rules() {
        assert_eq!(fee_adjusted_pnl(2.0, -10.0), (10.0, 0.0));
        assert_eq!(fee_adjusted_pnl(-2.0, -10.0), (-10.0, 0.0));
        assert_eq!(fee_adjusted_pnl(0.0, -10.0), (0.0, 0.0));
        assert_eq!(fee_adjusted_pnl(0.0, 4.0), (4.0, 0.0));
        assert_eq!(fee_adjusted_pnl(1.0, 4.0), (0.0, 4.0));
        assert_eq!(fee_adjusted_pnl(-1.0, 4.0), (0.0, 4.0));
    }

    #[test]
    fn test_zero_amount_is_flat() {
        let share = maker_share(&state(), 0.0, 100.0, 0.1, 10.0).unwrap();
        assert_eq!(share.position, 0.0);
        assert_eq!(share.balances, state().balances);
        assert_eq!(share.d, state().d);
    }

    #[test]
    fn test_untouched_pool_gives_flat_maker() {
        // 10% of supply minted against exactly 10% of the reserves
        let pos = maker_position(&state(), &CurveParams::default(), 100.0, 100_000.0, 100.0, 100.0)
            .unwrap();
        assert_eq!(pos.position, 0.0);
        assert_eq!(pos.open_notional, 0.0);
        assert_eq!(pos.unrealized_pnl, 0.0);
    }

    #[test]
    fn test_pro_rata_basis_is_flat() {
        let basis = MakerBasis::pro_rata(&state(), 0.1);
        assert_eq!(basis.dtoken, 100.0);
        assert_eq!(basis.notional(1_000.0), 200_000.0);

        let share =
            maker_share(&state(), basis.dtoken, basis.vusd, basis.vasset, basis.dtoken).unwrap();
        assert_eq!(share.position, 0.0);
    }

    #[test]
    fn test_partial_withdrawal_prorates_basis() {
        // Withdrawing half of a 10% stake
        let share = maker_share(&state(), 50.0, 100_000.0, 100.0, 100.0).unwrap();
        assert_eq!(share.position, 0.0);
        assert!((share.balances[0] - 950_000.0).abs() < 1e-6);
        assert!((share.d - 1_900_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_maker_short_after_pool_sold_base() {
        // Pool handed out base, so the maker is short and holds extra quote
        let mut s = state();
        s.balances = [1_010_000.0, 990.0];
        let share = maker_share(&s, 100.0, 100_000.0, 100.0, 100.0).unwrap();
        assert!((share.position + 1.0).abs() < 1e-9);
        assert!((share.open_notional - 1_000.0).abs() < 1e-6);
        assert_eq!(share.fee_adjusted_pnl, 0.0);
    }

    #[test]
    fn test_maker_inputs_rejected() {
        let s = state();
        let params = CurveParams::default();

        assert_eq!(
            maker_position(&s, &params, 10.0, 1_000.0, 1.0, 0.0).unwrap_err(),
            VammError::NonPositiveAmount { amount: 0.0 }
        );
        assert_eq!(
            maker_position(&s, &params, -10.0, 1_000.0, 1.0, 10.0).unwrap_err(),
            VammError::NonPositiveAmount { amount: -10.0 }
        );
        assert!(matches!(
            maker_position(&s, &params, f64::NAN, 1_000.0, 1.0, 10.0),
            Err(VammError::NonPositiveAmount { .. })
        ));
        assert_eq!(
            maker_position(&s, &params, 1_500.0, 1_000.0, 1.0, 1_500.0).unwrap_err(),
            VammError::InsufficientLiquidity {
                requested: 1_500.0,
                available: 1_000.0
            }
        );
        // Whole supply is still a valid withdrawal
        assert!(maker_share(&s, 1_000.0, 1_000_000.0, 1_000.0, 1_000.0).is_ok());
    }

    #[test]
    fn test_taker_long_and_short() {
        let s = state();
        let params = CurveParams::default();

        let long = taker_notional_and_pnl(5.0, 4_900.0, s.balances, s.d, s.price_scale, &params)
            .unwrap();
        assert!(long.notional > 4_990.0 && long.notional < 5_000.0);
        assert!((long.unrealized_pnl - (long.notional - 4_900.0)).abs() < 1e-9);

        let short = taker_notional_and_pnl(-5.0, 5_100.0, s.balances, s.d, s.price_scale, &params)
            .unwrap();
        assert!(short.notional > 5_000.0 && short.notional < 5_010.0);
        assert!((short.unrealized_pnl - (5_100.0 - short.notional)).abs() < 1e-9);

        let flat =
            taker_notional_and_pnl(0.0, 0.0, s.balances, s.d, s.price_scale, &params).unwrap();
        assert_eq!(flat, TakerPosition::default());
    }

    #[test]
    fn test_taker_short_beyond_reserve() {
        let s = state();
        let err = taker_notional_and_pnl(
            -1_500.0,
            0.0,
            s.balances,
            s.d,
            s.price_scale,
            &CurveParams::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            VammError::InsufficientLiquidity {
                requested: 1_500.0,
                available: 1_000.0
            }
        );
    }

    #[test]
    fn test_empty_pool_values_to_zero() {
        let pos =
            taker_notional_and_pnl(1.0, 10.0, [0.0, 0.0], 0.0, 1_000.0, &CurveParams::default())
                .unwrap();
        assert_eq!(pos, TakerPosition::default());
    }
}
