// src/core/live.rs
use crate::config::{AppConfig, StrategyConfig, StrategyOverrides};
use crate::connectors::traits::ExchangeClient;
use crate::core::risk::RiskPolicy;
use crate::core::slicer::TwapSlicer;
use crate::error::{EngineError, Result};
use crate::strategies::traits::BoxedStrategy;
use crate::types::{Portfolio, PriceUpdate, Trade, TradeSignal};
use crate::utils::precision::round_down_to_step;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveState {
    Idle,
    Initialized,
    Running,
    Stopping,
    Stopped,
}

/// Portfolio and trade log. Both are only touched while holding the one lock.
#[derive(Debug, Default)]
pub struct Ledger {
    pub portfolio: Portfolio,
    pub trades: Vec<Trade>,
}

/// Polls prices for every tracked symbol and trades them through the exchange.
///
/// Each symbol gets its own task and interval timer. A symbol's slice sequence
/// runs inside its task, so two signals for the same symbol never overlap.
pub struct LiveEngine {
    exchange: Arc<dyn ExchangeClient>,
    strategy: Arc<Mutex<BoxedStrategy>>,
    overrides: StrategyOverrides,
    risk: RiskPolicy,
    symbols: Vec<String>,
    poll_interval: Duration,
    quantity_step: Decimal,
    ledger: Arc<Mutex<Ledger>>,
    state: LiveState,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl LiveEngine {
    pub fn new(
        exchange: Arc<dyn ExchangeClient>,
        strategy: BoxedStrategy,
        config: &AppConfig,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        // One worker per distinct symbol keeps each symbol's slices sequential
        let mut seen = HashSet::new();
        let symbols = config
            .symbols
            .iter()
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect();
        Self {
            exchange,
            strategy: Arc::new(Mutex::new(strategy)),
            overrides: config.strategy.clone(),
            risk: RiskPolicy::new(config.risk.clone()),
            symbols,
            poll_interval: config.poll_interval(),
            quantity_step: config.exchange.quantity_step,
            ledger: Arc::new(Mutex::new(Ledger::default())),
            state: LiveState::Idle,
            shutdown,
            tasks: Vec::new(),
        }
    }

    pub fn state(&self) -> LiveState {
        self.state
    }

    pub async fn portfolio(&self) -> Portfolio {
        self.ledger.lock().await.portfolio.clone()
    }

    pub async fn trades(&self) -> Vec<Trade> {
        self.ledger.lock().await.trades.clone()
    }

    /// Loads the account snapshot and prepares the strategy.
    pub async fn initialize(&mut self) -> Result<()> {
        self.expect_state(LiveState::Idle, "Idle")?;

        let account = self
            .exchange
            .get_account()
            .await
            .map_err(EngineError::Exchange)?;
        info!(
            cash = %account.cash,
            assets = account.assets.len(),
            "Account loaded"
        );
        self.ledger.lock().await.portfolio = account;
        self.strategy.lock().await.initialize(&self.overrides);

        self.state = LiveState::Initialized;
        Ok(())
    }

    /// Spawns one polling task per symbol. The first poll happens immediately.
    pub fn start(&mut self) -> Result<()> {
        self.expect_state(LiveState::Initialized, "Initialized")?;
        if self.poll_interval.is_zero() {
            return Err(EngineError::InvalidConfig(
                "poll interval must be positive".to_string(),
            ));
        }

        let config = StrategyConfig::merged(&self.overrides);
        let slicer = TwapSlicer::from_config(&config);

        for symbol in &self.symbols {
            let worker = SymbolWorker {
                symbol: symbol.clone(),
                exchange: Arc::clone(&self.exchange),
                strategy: Arc::clone(&self.strategy),
                ledger: Arc::clone(&self.ledger),
                slicer: slicer.clone(),
                risk: self.risk.clone(),
                quantity_step: self.quantity_step,
            };
            let shutdown = self.shutdown.subscribe();
            let interval = self.poll_interval;
            self.tasks.push(tokio::spawn(worker.run(interval, shutdown)));
        }

        info!(
            symbols = ?self.symbols,
            interval_secs = self.poll_interval.as_secs(),
            "Live engine running"
        );
        self.state = LiveState::Running;
        Ok(())
    }

    /// Stops polling and clears strategy state.
    ///
    /// No poll starts after this is called. Slice sequences already in flight
    /// finish before it returns. Calling it again is a no-op.
    pub async fn stop(&mut self) -> Result<()> {
        if matches!(self.state, LiveState::Stopping | LiveState::Stopped) {
            return Ok(());
        }
        self.state = LiveState::Stopping;
        info!("Live engine stopping...");

        self.shutdown.send_replace(true);
        for result in futures::future::join_all(self.tasks.drain(..)).await {
            if let Err(e) = result {
                error!("Symbol task ended abnormally: {}", e);
            }
        }

        self.strategy.lock().await.on_end();
        self.state = LiveState::Stopped;
        info!("Live engine stopped");
        Ok(())
    }

    fn expect_state(&self, expected: LiveState, name: &'static str) -> Result<()> {
        if self.state != expected {
            return Err(EngineError::InvalidState {
                expected: name,
                actual: format!("{:?}", self.state),
            });
        }
        Ok(())
    }
}

struct SymbolWorker {
    symbol: String,
    exchange: Arc<dyn ExchangeClient>,
    strategy: Arc<Mutex<BoxedStrategy>>,
    ledger: Arc<Mutex<Ledger>>,
    slicer: TwapSlicer,
    risk: RiskPolicy,
    quantity_step: Decimal,
}

impl SymbolWorker {
    async fn run(self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    if let Err(e) = self.poll_once().await {
                        error!(symbol = %self.symbol, "Poll cycle failed: {}", e);
                    }
                }
            }
        }
        debug!(symbol = %self.symbol, "Polling task finished");
    }

    async fn poll_once(&self) -> Result<()> {
        let price = self
            .exchange
            .get_price(&self.symbol)
            .await
            .map_err(EngineError::Exchange)?;
        if price <= Decimal::ZERO {
            warn!(symbol = %self.symbol, %price, "Ignoring non-positive price");
            return Ok(());
        }

        let update = PriceUpdate::new(self.symbol.clone(), price, Utc::now().timestamp_millis());
        self.ledger.lock().await.portfolio.mark_price(&self.symbol, price);

        let signal = self.strategy.lock().await.on_update(&update);
        match signal {
            Some(signal) => {
                info!(symbol = %signal.symbol, side = %signal.action, "Signal: {}", signal.reason);
                self.execute(&signal, price).await
            }
            None => Ok(()),
        }
    }

    /// Sends the slices of one signal with a real delay between them. An
    /// exchange error aborts the rest of this signal only.
    async fn execute(&self, signal: &TradeSignal, price: Decimal) -> Result<()> {
        let plan = {
            let ledger = self.ledger.lock().await;
            self.slicer.plan(signal, &ledger.portfolio, price)
        };
        let Some(plan) = plan else {
            return Ok(());
        };

        for i in 0..plan.slices {
            if i > 0 {
                tokio::time::sleep(self.slicer.interval()).await;
            }

            let (order, cash) = {
                let ledger = self.ledger.lock().await;
                (plan.next_order(&ledger.portfolio, price), ledger.portfolio.cash)
            };
            let Some(order) = order else {
                break;
            };

            let quantity = round_down_to_step(order.quantity, self.quantity_step);
            if quantity.is_zero() {
                warn!(
                    symbol = %plan.symbol,
                    raw = %order.quantity,
                    "Slice rounds to zero quantity"
                );
                continue;
            }
            if let Err(reason) = self.risk.check_live(&plan.symbol, quantity, price, cash) {
                debug!(symbol = %plan.symbol, slice = i, ?reason, "Slice refused by risk policy");
                continue;
            }

            let trade = self
                .exchange
                .place_order(&plan.symbol, plan.side, quantity, None)
                .await
                .map_err(EngineError::Exchange)?;
            info!(
                symbol = %trade.symbol,
                side = %trade.side,
                quantity = %trade.quantity,
                price = %trade.price,
                slice = i + 1,
                of = plan.slices,
                "Slice filled"
            );

            let mut ledger = self.ledger.lock().await;
            ledger.portfolio.apply_trade(&trade);
            ledger.trades.push(trade);
        }
        Ok(())
    }
}
