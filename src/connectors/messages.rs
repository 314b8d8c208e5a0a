// src/connectors/messages.rs
//! REST payloads returned by the Binance spot API.
use rust_decimal::Decimal;
use serde::Deserialize;

/// `GET /api/v3/ticker/price`
#[derive(Debug, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub free: Decimal,
}

/// `GET /api/v3/account`
#[derive(Debug, Deserialize)]
pub struct AccountInfo {
    pub balances: Vec<Balance>,
}

#[derive(Debug, Deserialize)]
pub struct Fill {
    pub price: Decimal,
    pub qty: Decimal,
}

/// `POST /api/v3/order` with `newOrderRespType=FULL`
#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    #[serde(rename = "orderId")]
    pub order_id: u64,

    pub symbol: String,

    pub status: String,

    #[serde(rename = "transactTime")]
    pub transact_time: i64,

    #[serde(rename = "executedQty")]
    pub executed_qty: Decimal,

    #[serde(rename = "cummulativeQuoteQty")]
    pub cumulative_quote_qty: Decimal,

    #[serde(default)]
    pub fills: Vec<Fill>,
}

impl OrderResponse {
    /// Volume-weighted fill price, falling back to quote/base totals.
    pub fn average_price(&self) -> Option<Decimal> {
        let qty: Decimal = self.fills.iter().map(|f| f.qty).sum();
        if !qty.is_zero() {
            let quote: Decimal = self.fills.iter().map(|f| f.price * f.qty).sum();
            return Some(quote / qty);
        }
        if self.executed_qty.is_zero() {
            return None;
        }
        Some(self.cumulative_quote_qty / self.executed_qty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_full_order_response() {
        let json = r#"{
            "symbol": "ETHUSDT",
            "orderId": 28,
            "clientOrderId": "6gCrw2kRUAF9CvJDGP16IP",
            "transactTime": 1507725176595,
            "price": "0.00000000",
            "origQty": "3.00000000",
            "executedQty": "3.00000000",
            "cummulativeQuoteQty": "5400.00000000",
            "status": "FILLED",
            "fills": [
                {"price": "1790.00", "qty": "1.00", "commission": "0", "commissionAsset": "USDT"},
                {"price": "1805.00", "qty": "2.00", "commission": "0", "commissionAsset": "USDT"}
            ]
        }"#;
        let resp: OrderResponse = serde_json::from_str(json).unwrap();

        assert_eq!(resp.order_id, 28);
        assert_eq!(resp.status, "FILLED");
        assert_eq!(resp.average_price(), Some(dec!(1800)));
    }

    #[test]
    fn average_price_without_fills_uses_totals() {
        let json = r#"{"symbol":"ETHUSDT","orderId":1,"transactTime":0,"status":"FILLED",
            "executedQty":"2","cummulativeQuoteQty":"3000"}"#;
        let resp: OrderResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.average_price(), Some(dec!(1500)));
    }

    #[test]
    fn parses_account_balances() {
        let json = r#"{"makerCommission":15,"balances":[
            {"asset":"USDT","free":"1000.5","locked":"0"},
            {"asset":"ETH","free":"2.25","locked":"0.1"}]}"#;
        let info: AccountInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.balances.len(), 2);
        assert_eq!(info.balances[1].free, dec!(2.25));
    }
}
