// src/types.rs
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single price observation. `timestamp` is milliseconds since the epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub symbol: String,
    pub price: Decimal,
    pub timestamp: i64,
}

impl PriceUpdate {
    pub fn new(symbol: impl Into<String>, price: Decimal, timestamp: i64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
        }
    }
}

/// Strategy output for one update.
///
/// `percentage` is a fraction of total portfolio value for a BUY and a
/// fraction of current holdings for a SELL.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeSignal {
    pub symbol: String,
    pub action: Side,
    pub percentage: Decimal,
    pub reason: String,
}

/// An executed child order. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub timestamp: i64,
}

impl Trade {
    pub fn notional(&self) -> Decimal {
        self.quantity * self.price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub price: Decimal,
    pub holdings: Decimal,
}

impl Asset {
    pub fn new(symbol: impl Into<String>, price: Decimal, holdings: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            holdings,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub cash: Decimal,
    pub assets: HashMap<String, Asset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub final_portfolio: Portfolio,
    /// Percent, e.g. `1.5` means +1.5%.
    pub total_return: Decimal,
    pub sharpe_ratio: Decimal,
    /// Percent of the running peak.
    pub max_drawdown: Decimal,
}
