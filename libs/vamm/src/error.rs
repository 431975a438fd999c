//! Error taxonomy for the pricing engine
//!
//! Solver failures bubble up unmodified through quoting and the oracle
//! tracker; nothing in the engine swallows them. Callers decide policy
//! through [`VammError::is_fatal`].

use thiserror::Error;

/// Engine errors, from numerical solver faults to caller input mistakes
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VammError {
    /// A, gamma, D or a seed balance outside its configured band
    #[error("unsafe value for {name}: {value}")]
    UnsafeParameter { name: &'static str, value: f64 },

    /// A mid-computation ratio left its valid band
    #[error("unsafe intermediate value for {name}: {value}")]
    UnsafeIntermediateValue { name: &'static str, value: f64 },

    /// Newton iteration hit the 255 step ceiling
    #[error("{solver} did not converge")]
    DidNotConverge { solver: &'static str },

    /// Realized amount violated the caller's bound
    #[error("slippage exceeded: realized {realized}, limit {limit}")]
    SlippageExceeded { realized: f64, limit: f64 },

    /// Virtual price went down between two price updates
    #[error("loss detected: virtual price {current} below previous {previous}")]
    LossDetected { previous: f64, current: f64 },

    #[error("same input and output coin")]
    SameAsset,

    #[error("coin index {index} out of range")]
    IndexOutOfRange { index: usize },

    #[error("can only exchange positive amounts, got {amount}")]
    NonPositiveAmount { amount: f64 },

    /// Pool cannot supply the requested base quantity
    #[error("insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: f64, available: f64 },

    /// On-chain snapshot could not be decoded into a usable pool state
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Configuration value rejected by validation
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Trade sizing walked past its step budget without reaching the target
    #[error("trade size search exhausted after {steps} steps (size {size})")]
    SizeSearchExhausted { steps: usize, size: f64 },

    /// Predicted mark price overshot the target beyond tolerance
    #[error("mark price {mark_price} overshot target {target}")]
    TargetOvershoot { mark_price: f64, target: f64 },
}

/// Solver-level alias used by the invariant and balance solvers
pub type MathError = VammError;

pub type Result<T> = std::result::Result<T, VammError>;

impl VammError {
    /// Errors that warrant halting and alerting rather than re-quoting
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VammError::LossDetected { .. }
                | VammError::UnsafeIntermediateValue { .. }
                | VammError::UnsafeParameter { .. }
        )
    }
}
