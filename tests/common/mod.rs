//! Shared fixtures for backtest scenarios

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use twap_trader::core::backtest::BacktestEngine;
use twap_trader::strategies::threshold::ThresholdStrategy;
use twap_trader::{Asset, Portfolio, PriceUpdate, RiskLimits, StrategyOverrides};

/// 100k cash plus 10 ETH marked at 2000.
pub fn eth_portfolio() -> Portfolio {
    Portfolio::new(dec!(100000)).with_asset(Asset::new("ETHUSDT", dec!(2000), dec!(10)))
}

pub fn threshold_engine(overrides: StrategyOverrides, limits: RiskLimits) -> BacktestEngine {
    BacktestEngine::new(Box::new(ThresholdStrategy::new()), overrides, limits)
}

pub fn default_engine() -> BacktestEngine {
    threshold_engine(StrategyOverrides::default(), RiskLimits::default())
}

/// One update per price, one minute apart.
pub fn series(symbol: &str, prices: &[Decimal]) -> Vec<PriceUpdate> {
    prices
        .iter()
        .enumerate()
        .map(|(i, p)| PriceUpdate::new(symbol, *p, i as i64 * 60_000))
        .collect()
}
