// src/core/slicer.rs
use crate::config::StrategyConfig;
use crate::core::risk::RiskPolicy;
use crate::types::{Portfolio, Side, Trade, TradeSignal};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::debug;

/// One signal broken into equal child orders.
///
/// `per_slice` is a notional amount for BUY plans and a quantity for SELL plans.
#[derive(Debug, Clone, PartialEq)]
pub struct SlicePlan {
    pub symbol: String,
    pub side: Side,
    pub slices: u32,
    pub per_slice: Decimal,
}

/// Child order produced by [`SlicePlan::next_order`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildOrder {
    pub quantity: Decimal,
    /// Cash moved by the fill: debited for BUY, credited for SELL.
    pub cash: Decimal,
}

impl SlicePlan {
    /// Sizes the next child order against the current portfolio, or `None`
    /// when nothing more can be executed for this signal.
    pub fn next_order(&self, portfolio: &Portfolio, price: Decimal) -> Option<ChildOrder> {
        match self.side {
            Side::Buy => {
                if portfolio.cash < self.per_slice {
                    return None;
                }
                Some(ChildOrder {
                    quantity: self.per_slice / price,
                    cash: self.per_slice,
                })
            }
            Side::Sell => {
                // Clamp per slice: holdings can shrink between slices
                let quantity = self.per_slice.min(portfolio.holdings(&self.symbol));
                if quantity <= Decimal::ZERO {
                    return None;
                }
                Some(ChildOrder {
                    quantity,
                    cash: quantity * price,
                })
            }
        }
    }
}

/// Time-weighted slicing of trade signals.
#[derive(Debug, Clone)]
pub struct TwapSlicer {
    slices: u32,
    interval: Duration,
}

impl TwapSlicer {
    pub fn new(slices: u32, interval: Duration) -> Self {
        Self {
            slices: slices.max(1),
            interval,
        }
    }

    pub fn from_config(config: &StrategyConfig) -> Self {
        Self::new(config.twap_slices, config.twap_interval())
    }

    pub fn slices(&self) -> u32 {
        self.slices
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Splits `signal` at `price`. Returns `None` when the portfolio holds no
    /// entry for the symbol or the price is unusable.
    pub fn plan(
        &self,
        signal: &TradeSignal,
        portfolio: &Portfolio,
        price: Decimal,
    ) -> Option<SlicePlan> {
        if price <= Decimal::ZERO {
            return None;
        }
        let asset = portfolio.assets.get(&signal.symbol)?;

        let total = match signal.action {
            Side::Buy => portfolio.value_at(&signal.symbol, price) * signal.percentage,
            Side::Sell => asset.holdings * signal.percentage,
        };
        if total <= Decimal::ZERO {
            return None;
        }

        Some(SlicePlan {
            symbol: signal.symbol.clone(),
            side: signal.action,
            slices: self.slices,
            per_slice: total / Decimal::from(self.slices),
        })
    }

    /// Executes a signal against a simulated portfolio without waiting.
    ///
    /// Slice `i` is stamped `timestamp + i * interval`, saturating at
    /// `i64::MAX`. Slices refused by the
    /// risk policy are skipped; the first slice that cannot be funded (BUY) or
    /// has nothing left to sell (SELL) ends the sequence.
    pub fn simulate(
        &self,
        signal: &TradeSignal,
        portfolio: &mut Portfolio,
        price: Decimal,
        timestamp: i64,
        risk: &RiskPolicy,
    ) -> Vec<Trade> {
        let Some(plan) = self.plan(signal, portfolio, price) else {
            return Vec::new();
        };
        let step_ms = i64::try_from(self.interval.as_millis()).unwrap_or(i64::MAX);
        let mut trades = Vec::with_capacity(plan.slices as usize);

        for i in 0..plan.slices {
            let Some(order) = plan.next_order(portfolio, price) else {
                debug!(symbol = %plan.symbol, slice = i, "Slicing stopped early");
                break;
            };
            if risk.check(&plan.symbol, order.quantity, price).is_err() {
                continue;
            }

            match plan.side {
                Side::Buy => portfolio.apply_buy(&plan.symbol, order.quantity, price, order.cash),
                Side::Sell => {
                    portfolio.apply_sell(&plan.symbol, order.quantity, price);
                }
            }
            trades.push(Trade {
                symbol: plan.symbol.clone(),
                side: plan.side,
                quantity: order.quantity,
                price,
                timestamp: timestamp.saturating_add(step_ms.saturating_mul(i64::from(i))),
            });
        }
        trades
    }
}
