// src/strategies/traits.rs
use crate::config::StrategyOverrides;
use crate::types::{PriceUpdate, TradeSignal};

/// Decision logic driven by the engines.
///
/// Engines only hold a `Box<dyn Strategy>`, so any implementation that maps
/// a stream of [`PriceUpdate`]s to optional [`TradeSignal`]s can be plugged in.
pub trait Strategy: Send {
    fn name(&self) -> &str;

    // Called once before the first update of a run
    fn initialize(&mut self, overrides: &StrategyOverrides);

    fn on_update(&mut self, update: &PriceUpdate) -> Option<TradeSignal>;

    // Drop all per-symbol state; `initialize` must be called again before reuse
    fn on_end(&mut self);
}

pub type BoxedStrategy = Box<dyn Strategy>;
