// src/core/portfolio.rs
use crate::types::{Asset, Portfolio, Side, Trade};
use rust_decimal::Decimal;

impl Portfolio {
    pub fn new(cash: Decimal) -> Self {
        Self {
            cash,
            assets: Default::default(),
        }
    }

    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.assets.insert(asset.symbol.clone(), asset);
        self
    }

    pub fn holdings(&self, symbol: &str) -> Decimal {
        self.assets
            .get(symbol)
            .map(|a| a.holdings)
            .unwrap_or(Decimal::ZERO)
    }

    /// Cash plus every asset marked at its last known price.
    pub fn total_value(&self) -> Decimal {
        self.cash
            + self
                .assets
                .values()
                .map(|a| a.holdings * a.price)
                .sum::<Decimal>()
    }

    /// Same as [`total_value`](Self::total_value) but values `symbol` at `price`.
    pub fn value_at(&self, symbol: &str, price: Decimal) -> Decimal {
        self.cash
            + self
                .assets
                .values()
                .map(|a| {
                    let mark = if a.symbol == symbol { price } else { a.price };
                    a.holdings * mark
                })
                .sum::<Decimal>()
    }

    /// Records a new market price for a held symbol. Unknown symbols are ignored.
    pub fn mark_price(&mut self, symbol: &str, price: Decimal) {
        if let Some(asset) = self.assets.get_mut(symbol) {
            asset.price = price;
        }
    }

    /// Credits `quantity` of `symbol` and debits `cost` from cash.
    pub fn apply_buy(&mut self, symbol: &str, quantity: Decimal, price: Decimal, cost: Decimal) {
        self.cash -= cost;
        let asset = self
            .assets
            .entry(symbol.to_string())
            .or_insert_with(|| Asset::new(symbol, price, Decimal::ZERO));
        asset.holdings += quantity;
        asset.price = price;
    }

    /// Debits `quantity` of `symbol` and returns the cash proceeds.
    pub fn apply_sell(&mut self, symbol: &str, quantity: Decimal, price: Decimal) -> Decimal {
        let proceeds = quantity * price;
        if let Some(asset) = self.assets.get_mut(symbol) {
            asset.holdings -= quantity;
            asset.price = price;
        }
        self.cash += proceeds;
        proceeds
    }

    pub fn apply_trade(&mut self, trade: &Trade) {
        match trade.side {
            Side::Buy => {
                self.apply_buy(&trade.symbol, trade.quantity, trade.price, trade.notional())
            }
            Side::Sell => {
                self.apply_sell(&trade.symbol, trade.quantity, trade.price);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Portfolio {
        Portfolio::new(dec!(1000))
            .with_asset(Asset::new("BTCUSDT", dec!(100), dec!(2)))
            .with_asset(Asset::new("ETHUSDT", dec!(10), dec!(5)))
    }

    #[test]
    fn total_value_marks_every_asset() {
        assert_eq!(sample().total_value(), dec!(1250));
    }

    #[test]
    fn value_at_overrides_one_symbol() {
        assert_eq!(sample().value_at("BTCUSDT", dec!(50)), dec!(1150));
        assert_eq!(sample().value_at("XRPUSDT", dec!(50)), dec!(1250));
    }

    #[test]
    fn buy_then_sell_moves_cash_and_holdings() {
        let mut p = sample();
        p.apply_buy("BTCUSDT", dec!(1), dec!(120), dec!(120));
        assert_eq!(p.cash, dec!(880));
        assert_eq!(p.holdings("BTCUSDT"), dec!(3));
        assert_eq!(p.assets["BTCUSDT"].price, dec!(120));

        let proceeds = p.apply_sell("BTCUSDT", dec!(2), dec!(130));
        assert_eq!(proceeds, dec!(260));
        assert_eq!(p.cash, dec!(1140));
        assert_eq!(p.holdings("BTCUSDT"), dec!(1));
    }

    #[test]
    fn clone_does_not_alias() {
        let original = sample();
        let mut copy = original.clone();
        copy.apply_sell("ETHUSDT", dec!(5), dec!(10));
        assert_eq!(original.holdings("ETHUSDT"), dec!(5));
    }
}
