// src/core/backtest.rs
use crate::analytics::performance::PerformanceAnalyzer;
use crate::config::{RiskLimits, StrategyConfig, StrategyOverrides};
use crate::core::risk::RiskPolicy;
use crate::core::slicer::TwapSlicer;
use crate::strategies::traits::BoxedStrategy;
use crate::types::{BacktestResult, Portfolio, PriceUpdate, Trade};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacktestState {
    Idle,
    Initializing,
    Processing { index: usize, total: usize },
    Finalizing,
    Done,
}

/// Replays a recorded price sequence through a strategy and the TWAP slicer.
///
/// Updates are processed exactly in the order given; sort them first if
/// chronological order matters. No real clock is involved.
pub struct BacktestEngine {
    strategy: BoxedStrategy,
    overrides: StrategyOverrides,
    risk: RiskPolicy,
    state: BacktestState,
}

impl BacktestEngine {
    pub fn new(strategy: BoxedStrategy, overrides: StrategyOverrides, limits: RiskLimits) -> Self {
        Self {
            strategy,
            overrides,
            risk: RiskPolicy::new(limits),
            state: BacktestState::Idle,
        }
    }

    pub fn state(&self) -> BacktestState {
        self.state
    }

    /// Runs one backtest. `initial` is copied and never modified, so the same
    /// engine and portfolio can be reused for further runs.
    pub fn run(&mut self, updates: &[PriceUpdate], initial: &Portfolio) -> BacktestResult {
        self.state = BacktestState::Initializing;
        let config = StrategyConfig::merged(&self.overrides);
        let slicer = TwapSlicer::from_config(&config);
        self.strategy.initialize(&self.overrides);

        let mut portfolio = initial.clone();
        let mut trades: Vec<Trade> = Vec::new();

        info!(
            strategy = self.strategy.name(),
            updates = updates.len(),
            slices = slicer.slices(),
            "Backtest starting"
        );

        let total = updates.len();
        for (index, update) in updates.iter().enumerate() {
            self.state = BacktestState::Processing { index, total };

            if update.price <= Decimal::ZERO {
                warn!(
                    symbol = %update.symbol,
                    price = %update.price,
                    "Skipping non-positive price"
                );
                continue;
            }
            portfolio.mark_price(&update.symbol, update.price);

            let Some(signal) = self.strategy.on_update(update) else {
                continue;
            };
            debug!(
                symbol = %signal.symbol,
                side = %signal.action,
                reason = %signal.reason,
                "Signal"
            );

            let fills = slicer.simulate(
                &signal,
                &mut portfolio,
                update.price,
                update.timestamp,
                &self.risk,
            );
            trades.extend(fills);
        }

        self.state = BacktestState::Finalizing;
        self.strategy.on_end();
        let summary = PerformanceAnalyzer::summarize(initial, &portfolio, &trades);

        info!(
            trades = trades.len(),
            total_return = %summary.total_return.round_dp(4),
            sharpe = %summary.sharpe_ratio.round_dp(4),
            max_drawdown = %summary.max_drawdown.round_dp(4),
            "Backtest finished"
        );

        self.state = BacktestState::Done;
        BacktestResult {
            trades,
            final_portfolio: portfolio,
            total_return: summary.total_return,
            sharpe_ratio: summary.sharpe_ratio,
            max_drawdown: summary.max_drawdown,
        }
    }
}
