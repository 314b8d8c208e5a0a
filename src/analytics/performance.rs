//! Return, Sharpe ratio and drawdown for a finished backtest.
//!
//! Everything here is derived from the initial portfolio and the trade log.
//! The value series is indexed by trade: point 0 is the initial portfolio,
//! point `i` is the portfolio after replaying trade `i` with the traded asset
//! marked at the trade price and every other asset at its last known price.

use crate::types::{Portfolio, Trade};
use rust_decimal::{Decimal, MathematicalOps};

/// Trading periods per year used to annualize the Sharpe ratio.
///
/// Each trade counts as one period, which assumes roughly daily trades.
pub const PERIODS_PER_YEAR: u32 = 252;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSummary {
    pub total_return: Decimal,
    pub sharpe_ratio: Decimal,
    pub max_drawdown: Decimal,
}

pub struct PerformanceAnalyzer;

impl PerformanceAnalyzer {
    pub fn summarize(
        initial: &Portfolio,
        final_portfolio: &Portfolio,
        trades: &[Trade],
    ) -> PerformanceSummary {
        let series = Self::value_series(initial, trades);
        PerformanceSummary {
            total_return: Self::total_return(initial, final_portfolio),
            sharpe_ratio: Self::sharpe_ratio(&series, trades.len()),
            max_drawdown: Self::max_drawdown(&series),
        }
    }

    /// Percent change in total value between two snapshots.
    pub fn total_return(initial: &Portfolio, final_portfolio: &Portfolio) -> Decimal {
        let start = initial.total_value();
        if start.is_zero() {
            return Decimal::ZERO;
        }
        (final_portfolio.total_value() - start) / start * Decimal::ONE_HUNDRED
    }

    pub fn value_series(initial: &Portfolio, trades: &[Trade]) -> Vec<Decimal> {
        let mut replay = initial.clone();
        let mut series = Vec::with_capacity(trades.len() + 1);
        series.push(replay.total_value());

        for trade in trades {
            replay.apply_trade(trade);
            series.push(replay.value_at(&trade.symbol, trade.price));
        }
        series
    }

    /// `mean / stddev * sqrt(252)` over per-trade returns.
    ///
    /// Zero with fewer than two trades or when every return is identical.
    pub fn sharpe_ratio(series: &[Decimal], trade_count: usize) -> Decimal {
        if trade_count < 2 || series.len() < 2 {
            return Decimal::ZERO;
        }

        let returns: Vec<Decimal> = series
            .windows(2)
            .filter(|w| !w[0].is_zero())
            .map(|w| (w[1] - w[0]) / w[0])
            .collect();
        if returns.is_empty() {
            return Decimal::ZERO;
        }

        let n = Decimal::from(returns.len());
        let mean = returns.iter().sum::<Decimal>() / n;
        let variance = returns
            .iter()
            .map(|r| (*r - mean) * (*r - mean))
            .sum::<Decimal>()
            / n;

        let Some(stddev) = variance.sqrt() else {
            return Decimal::ZERO;
        };
        if stddev.is_zero() {
            return Decimal::ZERO;
        }
        let annualization = Decimal::from(PERIODS_PER_YEAR).sqrt().unwrap_or(Decimal::ONE);

        mean / stddev * annualization
    }

    /// Largest percentage fall from a running peak.
    pub fn max_drawdown(series: &[Decimal]) -> Decimal {
        let Some(first) = series.first() else {
            return Decimal::ZERO;
        };

        let mut peak = *first;
        let mut max_dd = Decimal::ZERO;
        for value in series {
            if *value > peak {
                peak = *value;
            } else if peak > Decimal::ZERO {
                let dd = (peak - *value) / peak * Decimal::ONE_HUNDRED;
                max_dd = max_dd.max(dd);
            }
        }
        max_dd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Asset, Side};
    use rust_decimal_macros::dec;

    fn trade(side: Side, qty: Decimal, price: Decimal) -> Trade {
        Trade {
            symbol: "BTCUSDT".to_string(),
            side,
            quantity: qty,
            price,
            timestamp: 0,
        }
    }

    fn start() -> Portfolio {
        Portfolio::new(dec!(1000)).with_asset(Asset::new("BTCUSDT", dec!(100), dec!(10)))
    }

    #[test]
    fn sharpe_is_zero_for_short_logs() {
        let p = start();
        let empty = PerformanceAnalyzer::value_series(&p, &[]);
        assert_eq!(PerformanceAnalyzer::sharpe_ratio(&empty, 0), Decimal::ZERO);

        let one = [trade(Side::Buy, dec!(1), dec!(90))];
        let series = PerformanceAnalyzer::value_series(&p, &one);
        assert_eq!(PerformanceAnalyzer::sharpe_ratio(&series, 1), Decimal::ZERO);
    }

    #[test]
    fn sharpe_is_zero_without_dispersion() {
        let series = [dec!(100), dec!(110), dec!(121)];
        assert_eq!(PerformanceAnalyzer::sharpe_ratio(&series, 2), Decimal::ZERO);
    }

    #[test]
    fn sharpe_sign_follows_mean_return() {
        let up = [dec!(100), dec!(110), dec!(115), dec!(130)];
        let down = [dec!(100), dec!(90), dec!(88), dec!(70)];
        assert!(PerformanceAnalyzer::sharpe_ratio(&up, 3) > Decimal::ZERO);
        assert!(PerformanceAnalyzer::sharpe_ratio(&down, 3) < Decimal::ZERO);
    }

    #[test]
    fn drawdown_zero_for_rising_series() {
        let series = [dec!(100), dec!(100), dec!(105), dec!(130)];
        assert_eq!(PerformanceAnalyzer::max_drawdown(&series), Decimal::ZERO);
    }

    #[test]
    fn drawdown_uses_running_peak() {
        let series = [dec!(100), dec!(120), dec!(90), dec!(150), dec!(135)];
        // 120 -> 90 is 25%, 150 -> 135 only 10%
        assert_eq!(PerformanceAnalyzer::max_drawdown(&series), dec!(25));
    }

    #[test]
    fn value_series_marks_traded_asset_at_trade_price() {
        let trades = [
            trade(Side::Buy, dec!(1), dec!(90)),
            trade(Side::Sell, dec!(2), dec!(120)),
        ];
        let series = PerformanceAnalyzer::value_series(&start(), &trades);
        // 1000 + 10*100; then 910 + 11*90; then 1150 + 9*120
        assert_eq!(series, vec![dec!(2000), dec!(1900), dec!(2230)]);
    }

    #[test]
    fn total_return_in_percent() {
        let mut end = start();
        end.cash = dec!(1500);
        assert_eq!(PerformanceAnalyzer::total_return(&start(), &end), dec!(25));
        assert_eq!(
            PerformanceAnalyzer::total_return(&Portfolio::default(), &end),
            Decimal::ZERO
        );
    }
}
