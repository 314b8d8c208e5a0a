// src/config.rs

use crate::error::EngineError;
use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Longest accepted pause between TWAP slices (one week).
pub const MAX_TWAP_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// Fully resolved strategy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Fractional drop from the initial price that triggers a BUY (0.05 = 5%).
    pub drop_threshold: Decimal,
    /// Fractional rise from the initial price that triggers a SELL.
    pub rise_threshold: Decimal,
    /// Fraction of total portfolio value to spend per BUY signal.
    pub buy_percentage: Decimal,
    /// Fraction of current holdings to sell per SELL signal.
    pub sell_percentage: Decimal,
    pub twap_slices: u32,
    pub twap_interval_secs: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            drop_threshold: Decimal::new(5, 2),
            rise_threshold: Decimal::new(5, 2),
            buy_percentage: Decimal::new(1, 1),
            sell_percentage: Decimal::new(2, 1),
            twap_slices: 5,
            twap_interval_secs: 60,
        }
    }
}

impl StrategyConfig {
    /// Defaults with every field present in `overrides` replaced.
    pub fn merged(overrides: &StrategyOverrides) -> Self {
        let defaults = Self::default();
        Self {
            drop_threshold: overrides.drop_threshold.unwrap_or(defaults.drop_threshold),
            rise_threshold: overrides.rise_threshold.unwrap_or(defaults.rise_threshold),
            buy_percentage: overrides.buy_percentage.unwrap_or(defaults.buy_percentage),
            sell_percentage: overrides.sell_percentage.unwrap_or(defaults.sell_percentage),
            twap_slices: overrides.twap_slices.unwrap_or(defaults.twap_slices),
            twap_interval_secs: overrides
                .twap_interval_secs
                .unwrap_or(defaults.twap_interval_secs),
        }
    }

    pub fn twap_interval(&self) -> Duration {
        Duration::from_secs(self.twap_interval_secs)
    }
}

/// Caller-supplied strategy settings. Absent fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyOverrides {
    #[serde(default)]
    pub drop_threshold: Option<Decimal>,
    #[serde(default)]
    pub rise_threshold: Option<Decimal>,
    #[serde(default)]
    pub buy_percentage: Option<Decimal>,
    #[serde(default)]
    pub sell_percentage: Option<Decimal>,
    #[serde(default)]
    pub twap_slices: Option<u32>,
    #[serde(default)]
    pub twap_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Max quantity per single order.
    #[serde(default = "default_max_position_size")]
    pub max_position_size: Decimal,
    /// Fractional cash headroom, only checked by the live driver.
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: Decimal,
    /// Max notional per single order.
    #[serde(default = "default_max_trade_size")]
    pub max_trade_size: Decimal,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_size: default_max_position_size(),
            max_daily_loss: default_max_daily_loss(),
            max_trade_size: default_max_trade_size(),
        }
    }
}

fn default_max_position_size() -> Decimal {
    Decimal::from(1000)
}

fn default_max_daily_loss() -> Decimal {
    Decimal::new(2, 2)
}

fn default_max_trade_size() -> Decimal {
    Decimal::from(10_000)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// LOT_SIZE step applied to live order quantities. Zero disables rounding.
    #[serde(default)]
    pub quantity_step: Decimal,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            quantity_step: Decimal::ZERO,
        }
    }
}

fn default_base_url() -> String {
    "https://api.binance.com".to_string()
}

/// Starting point for a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default = "default_initial_cash")]
    pub initial_cash: Decimal,
    /// Units of each tracked symbol held at the start.
    #[serde(default)]
    pub initial_holdings: Decimal,
    /// Number of synthetic ticks per symbol when no price file is given.
    #[serde(default = "default_synthetic_steps")]
    pub synthetic_steps: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_cash: default_initial_cash(),
            initial_holdings: Decimal::ZERO,
            synthetic_steps: default_synthetic_steps(),
        }
    }
}

fn default_initial_cash() -> Decimal {
    Decimal::from(100_000)
}

fn default_synthetic_steps() -> usize {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default = "default_quote_asset")]
    pub quote_asset: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub strategy: StrategyOverrides,
    #[serde(default)]
    pub risk: RiskLimits,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            quote_asset: default_quote_asset(),
            poll_interval_secs: default_poll_interval(),
            strategy: StrategyOverrides::default(),
            risk: RiskLimits::default(),
            exchange: ExchangeConfig::default(),
            backtest: BacktestConfig::default(),
            log_dir: default_log_dir(),
        }
    }
}

fn default_symbols() -> Vec<String> {
    vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]
}

fn default_quote_asset() -> String {
    "USDT".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl AppConfig {
    /// Loads `path` (if it exists) and then `APP_*` environment variables,
    /// e.g. `APP_RISK__MAX_TRADE_SIZE=5000`.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path).required(false));
            }
        }

        let config = builder
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("symbols")
                    .try_parsing(true),
            )
            .build()?;
        config.try_deserialize()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.symbols.is_empty() {
            return Err(EngineError::InvalidConfig(
                "at least one symbol is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.symbols.iter().find(|s| !seen.insert(s.as_str())) {
            return Err(EngineError::InvalidConfig(format!(
                "symbol {} is listed more than once",
                dup
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(EngineError::InvalidConfig(
                "poll_interval_secs must be positive".to_string(),
            ));
        }
        let strategy = StrategyConfig::merged(&self.strategy);
        if strategy.twap_slices == 0 {
            return Err(EngineError::InvalidConfig(
                "twap_slices must be at least 1".to_string(),
            ));
        }
        if strategy.twap_interval_secs > MAX_TWAP_INTERVAL_SECS {
            return Err(EngineError::InvalidConfig(format!(
                "twap_interval_secs must not exceed {}",
                MAX_TWAP_INTERVAL_SECS
            )));
        }
        if self.risk.max_trade_size <= Decimal::ZERO
            || self.risk.max_position_size <= Decimal::ZERO
        {
            return Err(EngineError::InvalidConfig(
                "risk limits must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
