//! Engine Configuration Module
//!
//! Loads pool parameters, sizing and replay settings from TOML files with
//! environment-specific overrides and `VAMM_` environment variables.

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use vamm::{CurveParams, OracleParams, ReplayConfig, SizingConfig};

/// Default location of the base configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/vamm.toml";

/// Everything needed to stand up and exercise a pool mirror
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Curve constants of the mirrored pool
    pub curve: CurveParams,

    /// EMA and repeg tuning
    pub oracle: OracleParams,

    /// Trade sizing for simulations and depth
    pub sizing: SizingConfig,

    /// Replay settings
    pub simulation: ReplayConfig,

    /// Initial deposit used when no snapshot is supplied
    pub seed: PoolSeed,
}

/// Initial liquidity of a bootstrapped pool
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolSeed {
    pub quote_balance: f64,
    pub base_balance: f64,
    pub price_scale: f64,
    /// Unix seconds of the initial deposit
    pub start_time: i64,
}

impl Default for PoolSeed {
    fn default() -> Self {
        Self {
            quote_balance: 1_000_000.0,
            base_balance: 1_000.0,
            price_scale: 1_000.0,
            start_time: 0,
        }
    }
}

impl PoolSeed {
    pub fn balances(&self) -> [f64; 2] {
        [self.quote_balance, self.base_balance]
    }
}

impl EngineConfig {
    /// Load configuration from files with environment overrides
    ///
    /// Sources, lowest precedence first: `base_path` (or
    /// [`DEFAULT_CONFIG_PATH`]), `environments/<environment>.toml` next to
    /// it, then `VAMM_<SECTION>__<KEY>` environment variables.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));

        let mut builder = Config::builder().add_source(File::from(base).required(true));

        if let Some(env) = environment {
            let env_file = base
                .parent()
                .unwrap_or(Path::new("."))
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("VAMM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Parse an embedded TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()
            .context("Failed to parse configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = self.to_toml_string()?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write configuration to {:?}", path))
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.curve.validate().context("Invalid [curve] section")?;
        self.oracle.validate().context("Invalid [oracle] section")?;
        self.sizing.validate().context("Invalid [sizing] section")?;

        let simulation = &self.simulation;
        if !(simulation.maker_share > 0.0 && simulation.maker_share <= 1.0) {
            anyhow::bail!("simulation.maker_share must be in (0, 1]");
        }
        if !(simulation.depth_band > 0.0 && simulation.depth_band < 1.0) {
            anyhow::bail!("simulation.depth_band must be in (0, 1)");
        }
        if !(simulation.candles_per_day > 0.0) {
            anyhow::bail!("simulation.candles_per_day must be positive");
        }

        let seed = &self.seed;
        if !(seed.quote_balance > 0.0 && seed.base_balance > 0.0 && seed.price_scale > 0.0) {
            anyhow::bail!("seed balances and price_scale must be positive");
        }

        Ok(())
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(path: Option<PathBuf>, environment: Option<&str>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(Some(&path), environment),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => EngineConfig::load(None, environment),
        None => {
            info!("No configuration file found, using defaults");
            let config = EngineConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const BASE: &str = r#"
[curve]
a = 400000
gamma = 0.000145
mid_fee = 0.001

[oracle]
ma_half_time = 900

[sizing]
unit_trade = 2.5

[simulation]
close_only = true

[seed]
quote_balance = 2500000
base_balance = 22768.67
price_scale = 109.8
"#;

    #[test]
    fn test_load_base_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("vamm.toml");
        fs::write(&config_path, BASE).unwrap();

        let config = EngineConfig::load(Some(&config_path), None).unwrap();

        assert_eq!(config.curve.mid_fee, 0.001);
        assert_eq!(config.oracle.ma_half_time, 900.0);
        // Unset keys keep their defaults
        assert_eq!(config.oracle.adjustment_step, 0.000146);
        assert_eq!(config.sizing.unit_trade, 2.5);
        assert_eq!(config.sizing.max_steps, 1_000);
        assert!(config.simulation.close_only);
        assert_eq!(config.seed.price_scale, 109.8);
    }

    #[test]
    fn test_environment_file_override() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("vamm.toml");
        fs::write(&config_path, BASE).unwrap();
        fs::create_dir(dir.path().join("environments")).unwrap();
        fs::write(
            dir.path().join("environments").join("stress.toml"),
            "[curve]\nmid_fee = 0.003\n",
        )
        .unwrap();

        let config = EngineConfig::load(Some(&config_path), Some("stress")).unwrap();
        assert_eq!(config.curve.mid_fee, 0.003);
        assert_eq!(config.oracle.ma_half_time, 900.0);

        // Unknown environments fall back to the base file
        let config = EngineConfig::load(Some(&config_path), Some("missing")).unwrap();
        assert_eq!(config.curve.mid_fee, 0.001);
    }

    #[test]
    fn test_environment_variable_override() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("vamm.toml");
        fs::write(&config_path, BASE).unwrap();

        std::env::set_var("VAMM_ORACLE__TRADE_INTERVAL_SECS", "12");
        let config = EngineConfig::load(Some(&config_path), None);
        std::env::remove_var("VAMM_ORACLE__TRADE_INTERVAL_SECS");

        assert_eq!(config.unwrap().oracle.trade_interval_secs, 12);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = EngineConfig::load(Some(&dir.path().join("absent.toml")), None).unwrap_err();
        assert!(err.to_string().contains("Failed to build configuration"));
    }

    #[test]
    fn test_validation_rejects_unsafe_curve() {
        let err = EngineConfig::from_toml_str("[curve]\ngamma = 0.5\n").unwrap_err();
        assert!(format!("{:#}", err).contains("gamma"));

        let err = EngineConfig::from_toml_str("[simulation]\nmaker_share = 0.0\n").unwrap_err();
        assert!(err.to_string().contains("maker_share"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::from_toml_str(BASE).unwrap();
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);

        let dir = tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        config.save_to_file(&path).unwrap();
        let saved = fs::read_to_string(&path).unwrap();
        assert_eq!(EngineConfig::from_toml_str(&saved).unwrap(), config);
    }
}
