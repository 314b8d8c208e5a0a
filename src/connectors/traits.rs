use crate::types::{Portfolio, Side, Trade};
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Everything the live engine needs from an exchange.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    async fn get_price(&self, symbol: &str) -> Result<Decimal>;

    // Cash plus holdings for the tracked symbols, priced at the current ticker
    async fn get_account(&self) -> Result<Portfolio>;

    /// Sends an order and returns the resulting fill.
    ///
    /// `limit_price` of `None` means a market order.
    async fn place_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        limit_price: Option<Decimal>,
    ) -> Result<Trade>;
}
