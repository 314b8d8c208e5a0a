// src/core/risk.rs
use crate::config::RiskLimits;
use rust_decimal::Decimal;

/// Why a child order was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskRejection {
    TradeSizeExceeded,
    PositionSizeExceeded,
    InsufficientHeadroom,
}

/// Stateless pre-trade checks against [`RiskLimits`].
#[derive(Debug, Clone)]
pub struct RiskPolicy {
    limits: RiskLimits,
}

impl RiskPolicy {
    pub fn new(limits: RiskLimits) -> Self {
        Self { limits }
    }

    /// Checks applied to every order, simulated or live.
    pub fn check(
        &self,
        _symbol: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<(), RiskRejection> {
        if quantity * price > self.limits.max_trade_size {
            return Err(RiskRejection::TradeSizeExceeded);
        }
        if quantity > self.limits.max_position_size {
            return Err(RiskRejection::PositionSizeExceeded);
        }
        Ok(())
    }

    /// [`check`](Self::check) plus the cash headroom rule
    /// `notional <= cash * (1 + max_daily_loss)`. Only the live driver uses it.
    pub fn check_live(
        &self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
        cash: Decimal,
    ) -> Result<(), RiskRejection> {
        self.check(symbol, quantity, price)?;
        if quantity * price > cash * (Decimal::ONE + self.limits.max_daily_loss) {
            return Err(RiskRejection::InsufficientHeadroom);
        }
        Ok(())
    }
}
