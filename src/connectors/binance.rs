// src/connectors/binance.rs
use crate::connectors::messages::{AccountInfo, OrderResponse, TickerPrice};
use crate::connectors::traits::ExchangeClient;
use crate::types::{Asset, Portfolio, Side, Trade};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tracing::{debug, info};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Signed REST client for Binance spot.
pub struct BinanceClient {
    api_key: String,
    secret_key: String,
    http_client: Client,
    base_rest_url: String,
    symbols: Vec<String>,
    quote_asset: String,
}

impl BinanceClient {
    pub fn new(
        api_key: String,
        secret_key: String,
        base_rest_url: impl Into<String>,
        symbols: Vec<String>,
        quote_asset: impl Into<String>,
    ) -> Self {
        Self {
            api_key,
            secret_key,
            http_client: Client::new(),
            base_rest_url: base_rest_url.into(),
            symbols,
            quote_asset: quote_asset.into(),
        }
    }

    fn sign_and_build_query(&self, params: Vec<(&str, String)>) -> Result<String> {
        let mut params = params;
        params.push(("timestamp", Utc::now().timestamp_millis().to_string()));

        let query_string = serde_urlencoded::to_string(&params)?;
        let signature = sign(&self.secret_key, &query_string)?;

        Ok(format!("{}&signature={}", query_string, signature))
    }

    async fn send_signed_request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        params: Vec<(&str, String)>,
    ) -> Result<T> {
        let full_query = self.sign_and_build_query(params)?;
        let url = format!("{}{}?{}", self.base_rest_url, endpoint, full_query);

        let response = self
            .http_client
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("Binance request to {} failed", endpoint))?;

        Ok(response.json::<T>().await?)
    }

    /// `ETHUSDT` -> `ETH` when the quote asset is `USDT`.
    fn base_asset<'a>(&self, symbol: &'a str) -> Option<&'a str> {
        symbol
            .strip_suffix(self.quote_asset.as_str())
            .filter(|base| !base.is_empty())
    }
}

/// Hex HMAC-SHA256 of `payload` keyed by `secret`.
fn sign(secret: &str, payload: &str) -> Result<String> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).context("Invalid secret key length")?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn get_price(&self, symbol: &str) -> Result<Decimal> {
        let url = format!(
            "{}/api/v3/ticker/price?symbol={}",
            self.base_rest_url, symbol
        );
        let ticker = self
            .http_client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<TickerPrice>()
            .await
            .with_context(|| format!("Failed to parse price for {}", symbol))?;

        debug!(symbol = %ticker.symbol, price = %ticker.price, "Ticker");
        Ok(ticker.price)
    }

    async fn get_account(&self) -> Result<Portfolio> {
        let info: AccountInfo = self
            .send_signed_request(Method::GET, "/api/v3/account", vec![])
            .await?;

        let cash = info
            .balances
            .iter()
            .find(|b| b.asset == self.quote_asset)
            .map(|b| b.free)
            .ok_or_else(|| anyhow!("Asset {} not found in account", self.quote_asset))?;

        let mut portfolio = Portfolio::new(cash);
        for symbol in &self.symbols {
            let base = self
                .base_asset(symbol)
                .ok_or_else(|| anyhow!("{} is not quoted in {}", symbol, self.quote_asset))?;
            let holdings = info
                .balances
                .iter()
                .find(|b| b.asset == base)
                .map(|b| b.free)
                .unwrap_or(Decimal::ZERO);
            let price = self.get_price(symbol).await?;
            portfolio = portfolio.with_asset(Asset::new(symbol.clone(), price, holdings));
        }
        Ok(portfolio)
    }

    async fn place_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        limit_price: Option<Decimal>,
    ) -> Result<Trade> {
        let mut params = vec![
            ("symbol", symbol.to_string()),
            ("side", side.as_str().to_string()),
            ("quantity", quantity.to_string()),
            ("newClientOrderId", Uuid::new_v4().simple().to_string()),
            ("newOrderRespType", "FULL".to_string()),
        ];

        // LIMIT IOC when a price is given, so the order never rests on the book
        match limit_price {
            Some(price) => {
                params.push(("type", "LIMIT".to_string()));
                params.push(("timeInForce", "IOC".to_string()));
                params.push(("price", price.to_string()));
            }
            None => params.push(("type", "MARKET".to_string())),
        }

        info!("Sending order: {} {} {} @ {:?}", side, quantity, symbol, limit_price);

        let resp: OrderResponse = self
            .send_signed_request(Method::POST, "/api/v3/order", params)
            .await?;

        let price = resp.average_price().ok_or_else(|| {
            anyhow!(
                "Order {} for {} was not filled ({})",
                resp.order_id,
                resp.symbol,
                resp.status
            )
        })?;

        Ok(Trade {
            symbol: resp.symbol,
            side,
            quantity: resp.executed_qty,
            price,
            timestamp: resp.transact_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> BinanceClient {
        BinanceClient::new(
            "key".to_string(),
            "secret".to_string(),
            "http://localhost",
            vec!["ETHUSDT".to_string()],
            "USDT",
        )
    }

    #[test]
    fn signature_matches_binance_reference() {
        // Example from the Binance API docs (SIGNED endpoint security)
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let payload = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            sign(secret, payload).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn query_is_signed_last() {
        let query = client()
            .sign_and_build_query(vec![("symbol", "ETHUSDT".to_string())])
            .unwrap();
        assert!(query.starts_with("symbol=ETHUSDT&timestamp="));
        assert!(query.contains("&signature="));
    }

    #[test]
    fn base_asset_strips_quote() {
        let c = client();
        assert_eq!(c.base_asset("ETHUSDT"), Some("ETH"));
        assert_eq!(c.base_asset("USDT"), None);
        assert_eq!(c.base_asset("ETHBTC"), None);
    }
}
