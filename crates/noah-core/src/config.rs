use crate::amount::{parse_amount, serde_amount};
use crate::{CoinSymbol, BASE_COIN_SYMBOL, COMMISSION_MULTIPLIER, CONVERT_TX_COMMISSION};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config encode error: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("environment variable {name}: {reason}")]
    Env { name: &'static str, reason: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Protocol constants the estimator needs, passed in as one immutable value
/// instead of being read from process-wide globals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Reserve coin every other coin is backed by
    pub base_coin: CoinSymbol,
    /// Commission units of a convert transaction
    #[serde(with = "serde_amount")]
    pub convert_commission: BigUint,
    /// PIP per commission unit
    #[serde(with = "serde_amount")]
    pub commission_multiplier: BigUint,
    /// Multiply the commission by the caller's gas price. Off by default: the
    /// sell-all estimate charges the flat convert commission.
    pub scale_commission_by_gas_price: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            base_coin: CoinSymbol::new(BASE_COIN_SYMBOL),
            convert_commission: BigUint::from(CONVERT_TX_COMMISSION),
            commission_multiplier: BigUint::from(COMMISSION_MULTIPLIER),
            scale_commission_by_gas_price: false,
        }
    }
}

impl EstimatorConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EstimatorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load estimator config from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by `NOAH_BASE_COIN`, `NOAH_CONVERT_COMMISSION`,
    /// `NOAH_COMMISSION_MULTIPLIER` and `NOAH_SCALE_COMMISSION_BY_GAS_PRICE`
    pub fn load_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`EstimatorConfig::load_from_env`] with variables read through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(symbol) = lookup("NOAH_BASE_COIN") {
            config.base_coin = CoinSymbol::new(&symbol);
        }

        if let Some(value) = lookup("NOAH_CONVERT_COMMISSION") {
            config.convert_commission = parse_amount(&value).map_err(|e| ConfigError::Env {
                name: "NOAH_CONVERT_COMMISSION",
                reason: e.to_string(),
            })?;
        }

        if let Some(value) = lookup("NOAH_COMMISSION_MULTIPLIER") {
            config.commission_multiplier = parse_amount(&value).map_err(|e| ConfigError::Env {
                name: "NOAH_COMMISSION_MULTIPLIER",
                reason: e.to_string(),
            })?;
        }

        if let Some(value) = lookup("NOAH_SCALE_COMMISSION_BY_GAS_PRICE") {
            config.scale_commission_by_gas_price =
                value.parse().map_err(|e: std::str::ParseBoolError| ConfigError::Env {
                    name: "NOAH_SCALE_COMMISSION_BY_GAS_PRICE",
                    reason: e.to_string(),
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Save estimator config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_coin.is_empty() {
            return Err(ConfigError::Invalid("base_coin cannot be empty".to_string()));
        }

        if self.convert_commission.is_zero() || self.commission_multiplier.is_zero() {
            return Err(ConfigError::Invalid(
                "convert commission and multiplier must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Base-coin commission of one convert transaction.
    /// A gas price below 1 is raised to 1.
    pub fn commission_in_base_coin(&self, gas_price: u64) -> BigUint {
        let commission = &self.convert_commission * &self.commission_multiplier;
        if self.scale_commission_by_gas_price {
            commission * gas_price.max(1)
        } else {
            commission
        }
    }

    pub fn is_base_coin(&self, symbol: &CoinSymbol) -> bool {
        *symbol == self.base_coin
    }
}
