//! Price feeds for backtests.

use crate::types::PriceUpdate;
use anyhow::{Context, Result};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::path::Path;

/// 2024-01-01T00:00:00Z, start of synthetic feeds.
const SYNTHETIC_EPOCH_MS: i64 = 1_704_067_200_000;
const SYNTHETIC_STEP_MS: i64 = 60_000;

/// Reads a JSON array of price updates, e.g.
/// `[{"symbol": "ETHUSDT", "price": "2000.5", "timestamp": 1704067200000}]`.
///
/// Order is preserved as written in the file.
pub async fn load_price_file(path: impl AsRef<Path>) -> Result<Vec<PriceUpdate>> {
    let path = path.as_ref();
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read price file {}", path.display()))?;
    let updates: Vec<PriceUpdate> = serde_json::from_str(&data)
        .with_context(|| format!("Invalid price file {}", path.display()))?;
    Ok(updates)
}

/// Stable sort by timestamp; updates sharing a timestamp keep their order.
pub fn sort_chronological(updates: &mut [PriceUpdate]) {
    updates.sort_by_key(|u| u.timestamp);
}

/// Deterministic oscillating feed, one update per symbol per minute.
///
/// Each symbol swings roughly ±12% around its own base price with a small
/// downward drift, enough to cross default thresholds in both directions.
pub fn synthetic_feed(symbols: &[String], steps: usize) -> Vec<PriceUpdate> {
    let mut updates = Vec::with_capacity(symbols.len() * steps);

    for step in 0..steps {
        let t = step as f64;
        let timestamp = SYNTHETIC_EPOCH_MS + step as i64 * SYNTHETIC_STEP_MS;

        for (i, symbol) in symbols.iter().enumerate() {
            let base = 100.0 * 10f64.powi(i as i32 % 3 + 1);
            let phase = i as f64 * 0.7;
            let wave = 0.1 * (t / 25.0 + phase).sin() + 0.02 * (t / 3.0).cos();
            let drift = -0.0002 * t;
            let price = Decimal::from_f64(base * (1.0 + wave + drift))
                .unwrap_or(Decimal::ONE)
                .round_dp(2);
            updates.push(PriceUpdate::new(symbol.clone(), price, timestamp));
        }
    }
    updates
}
