use crate::config::{StrategyConfig, StrategyOverrides};
use crate::strategies::traits::Strategy;
use crate::types::{PriceUpdate, Side, TradeSignal};
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

pub const HISTORY_CAPACITY: usize = 100;

#[derive(Debug)]
struct SymbolState {
    initial_price: Decimal,
    history: VecDeque<Decimal>,
}

/// Buys when the price falls `drop_threshold` below the first observed price
/// of a symbol and sells when it rises `rise_threshold` above it.
///
/// The baseline is never reset, so every update that stays past a threshold
/// fires again.
pub struct ThresholdStrategy {
    config: StrategyConfig,
    symbols: HashMap<String, SymbolState>,
}

impl ThresholdStrategy {
    pub fn new() -> Self {
        Self {
            config: StrategyConfig::default(),
            symbols: HashMap::new(),
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn initial_price(&self, symbol: &str) -> Option<Decimal> {
        self.symbols.get(symbol).map(|s| s.initial_price)
    }

    /// Most recent prices for `symbol`, oldest first.
    pub fn history(&self, symbol: &str) -> Option<&VecDeque<Decimal>> {
        self.symbols.get(symbol).map(|s| &s.history)
    }
}

impl Default for ThresholdStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for ThresholdStrategy {
    fn name(&self) -> &str {
        "threshold"
    }

    fn initialize(&mut self, overrides: &StrategyOverrides) {
        self.config = StrategyConfig::merged(overrides);
        info!(
            drop = %self.config.drop_threshold,
            rise = %self.config.rise_threshold,
            "Threshold strategy initialized"
        );
    }

    fn on_update(&mut self, update: &PriceUpdate) -> Option<TradeSignal> {
        // 1. Baseline on first observation
        if !self.symbols.contains_key(&update.symbol) {
            debug!(symbol = %update.symbol, price = %update.price, "Baseline price recorded");
            let mut history = VecDeque::with_capacity(HISTORY_CAPACITY);
            history.push_back(update.price);
            self.symbols.insert(
                update.symbol.clone(),
                SymbolState {
                    initial_price: update.price,
                    history,
                },
            );
            return None;
        }
        let state = self.symbols.get_mut(&update.symbol)?;

        if state.history.len() == HISTORY_CAPACITY {
            state.history.pop_front();
        }
        state.history.push_back(update.price);

        if state.initial_price.is_zero() {
            return None;
        }

        // 2. Compare against baseline
        let change = (update.price - state.initial_price) / state.initial_price;
        let hundred = Decimal::ONE_HUNDRED;

        if change <= -self.config.drop_threshold {
            return Some(TradeSignal {
                symbol: update.symbol.clone(),
                action: Side::Buy,
                percentage: self.config.buy_percentage,
                reason: format!(
                    "Price dropped {:.2}% from {}",
                    (-change * hundred).round_dp(2),
                    state.initial_price
                ),
            });
        }

        if change >= self.config.rise_threshold {
            return Some(TradeSignal {
                symbol: update.symbol.clone(),
                action: Side::Sell,
                percentage: self.config.sell_percentage,
                reason: format!(
                    "Price rose {:.2}% from {}",
                    (change * hundred).round_dp(2),
                    state.initial_price
                ),
            });
        }

        None
    }

    fn on_end(&mut self) {
        self.symbols.clear();
    }
}
