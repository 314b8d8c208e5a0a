//! Threshold trading bot with TWAP order slicing.
//!
//! A [`Strategy`](strategies::traits::Strategy) turns price updates into
//! signals, the [`TwapSlicer`](core::slicer::TwapSlicer) splits them into
//! child orders and the risk policy vets each one. The same pipeline runs in
//! a deterministic [`BacktestEngine`](core::backtest::BacktestEngine) and in
//! a polling [`LiveEngine`](core::live::LiveEngine) backed by an exchange.

pub mod analytics;
pub mod config;
pub mod connectors;
pub mod core;
pub mod data;
pub mod error;
pub mod logging;
pub mod strategies;
pub mod types;
pub mod utils;

pub use config::{AppConfig, RiskLimits, StrategyConfig, StrategyOverrides};
pub use error::{EngineError, Result};
pub use types::{Asset, BacktestResult, Portfolio, PriceUpdate, Side, Trade, TradeSignal};
