//! # VAMM Configuration
//!
//! Layered configuration for the pricing engine and the simulator: a base
//! TOML file, an optional per-environment overlay, then `VAMM_` environment
//! variables.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use vamm_config::EngineConfig;
//!
//! let config = EngineConfig::load(None, Some("stress")).unwrap();
//! println!("fee rate {}", config.curve.mid_fee);
//! ```
//!
//! Environment variables use `__` between section and key, e.g.
//! `VAMM_CURVE__MID_FEE=0.001`.

pub mod engine_config;

pub use engine_config::{load_config, EngineConfig, PoolSeed, DEFAULT_CONFIG_PATH};
