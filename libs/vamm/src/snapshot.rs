//! On-chain snapshot decoding
//!
//! The contract's `vars()` tuple arrives as unsigned fixed-point integers:
//! the quote balance has 6 decimals, the base balance and every ratio has
//! 18. Values are decoded through `Decimal` so the scale shift is exact
//! before the single conversion to `f64`.

use crate::error::{Result, VammError};
use crate::params::{CurveParams, OracleParams};
use crate::pool::Pool;
use crate::state::{PoolState, RepegState};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const QUOTE_DECIMALS: u32 = 6;
pub const BASE_DECIMALS: u32 = 18;

/// Raw `vars()` as decimal integer strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    pub balances: [String; 2],
    pub price_scale: String,
    pub price_oracle: String,
    pub last_prices: String,
    /// Whole seconds
    pub ma_half_time: String,
    pub total_supply: String,
    pub xcp_profit: String,
    pub virtual_price: String,
    pub adjustment_step: String,
    pub allowed_extra_profit: String,
    pub not_adjusted: bool,
    #[serde(rename = "D")]
    pub d: String,
    pub last_prices_timestamp: i64,
}

/// Shift a fixed-point integer string right by `decimals`
pub fn decode_fixed(field: &str, raw: &str, decimals: u32) -> Result<f64> {
    let mantissa: i128 = raw
        .trim()
        .parse()
        .map_err(|e| VammError::InvalidSnapshot(format!("{}: '{}' ({})", field, raw, e)))?;
    if mantissa < 0 {
        return Err(VammError::InvalidSnapshot(format!(
            "{}: negative value {}",
            field, raw
        )));
    }
    let value = Decimal::try_from_i128_with_scale(mantissa, decimals)
        .map_err(|e| VammError::InvalidSnapshot(format!("{}: '{}' ({})", field, raw, e)))?;
    value
        .to_f64()
        .ok_or_else(|| VammError::InvalidSnapshot(format!("{}: '{}' not representable", field, raw)))
}

impl RawSnapshot {
    pub fn decode(&self) -> Result<PoolState> {
        let ratio = |field: &str, raw: &str| decode_fixed(field, raw, BASE_DECIMALS);
        Ok(PoolState {
            balances: [
                decode_fixed("balances[0]", &self.balances[0], QUOTE_DECIMALS)?,
                ratio("balances[1]", &self.balances[1])?,
            ],
            d: ratio("D", &self.d)?,
            price_scale: ratio("price_scale", &self.price_scale)?,
            price_oracle: ratio("price_oracle", &self.price_oracle)?,
            last_prices: ratio("last_prices", &self.last_prices)?,
            last_prices_timestamp: self.last_prices_timestamp,
            ma_half_time: decode_fixed("ma_half_time", &self.ma_half_time, 0)?,
            total_supply: ratio("total_supply", &self.total_supply)?,
            xcp_profit: ratio("xcp_profit", &self.xcp_profit)?,
            virtual_price: ratio("virtual_price", &self.virtual_price)?,
            adjustment_step: ratio("adjustment_step", &self.adjustment_step)?,
            allowed_extra_profit: ratio("allowed_extra_profit", &self.allowed_extra_profit)?,
            not_adjusted: RepegState::from(self.not_adjusted),
        })
    }
}

impl Pool {
    /// Build a pool mirror from a raw chain snapshot
    pub fn from_snapshot(
        params: CurveParams,
        oracle: OracleParams,
        raw: &RawSnapshot,
    ) -> Result<Self> {
        Pool::new(params, oracle, raw.decode()?)
    }
}
