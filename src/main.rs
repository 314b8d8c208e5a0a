// src/main.rs
use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use rust_decimal::Decimal;
use std::env;
use std::sync::Arc;
use tracing::{error, info};
use twap_trader::config::AppConfig;
use twap_trader::connectors::binance::BinanceClient;
use twap_trader::core::backtest::BacktestEngine;
use twap_trader::core::live::LiveEngine;
use twap_trader::data;
use twap_trader::logging;
use twap_trader::strategies::threshold::ThresholdStrategy;
use twap_trader::types::{Asset, Portfolio};

#[derive(Parser, Debug)]
#[command(author, version, about = "Threshold trading bot with TWAP execution", long_about = None)]
struct Cli {
    /// Settings file (toml, json or yaml)
    #[arg(short, long, default_value = "Settings.toml", global = true)]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay prices through the strategy and report performance
    Backtest {
        /// JSON array of price updates; a synthetic feed is used when omitted
        #[arg(long)]
        prices: Option<String>,

        /// Sort updates by timestamp before replaying
        #[arg(long)]
        sort: bool,

        /// Write the full result as JSON
        #[arg(long)]
        output: Option<String>,
    },
    /// Poll the exchange and trade for real
    Live,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print()?;
            return Ok(());
        }
    };
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = AppConfig::load(Some(&cli.config)).context("Failed to load configuration")?;
    config.validate()?;
    let _guard = logging::init(logging::parse_level(&cli.log_level), &config.log_dir)?;

    match command {
        Command::Backtest {
            prices,
            sort,
            output,
        } => run_backtest(&config, prices, sort, output).await,
        Command::Live => run_live(&config).await,
    }
}

async fn run_backtest(
    config: &AppConfig,
    prices: Option<String>,
    sort: bool,
    output: Option<String>,
) -> Result<()> {
    let mut updates = match prices {
        Some(path) => data::load_price_file(&path).await?,
        None => data::synthetic_feed(&config.symbols, config.backtest.synthetic_steps),
    };
    if sort {
        data::sort_chronological(&mut updates);
    }

    // Seed each symbol at its first observed price
    let mut initial = Portfolio::new(config.backtest.initial_cash);
    for symbol in &config.symbols {
        let price = updates
            .iter()
            .find(|u| &u.symbol == symbol)
            .map(|u| u.price)
            .unwrap_or(Decimal::ZERO);
        initial = initial.with_asset(Asset::new(
            symbol.clone(),
            price,
            config.backtest.initial_holdings,
        ));
    }

    let mut engine = BacktestEngine::new(
        Box::new(ThresholdStrategy::new()),
        config.strategy.clone(),
        config.risk.clone(),
    );
    let result = engine.run(&updates, &initial);

    info!("========================================");
    info!("Trades:        {}", result.trades.len());
    info!("Final cash:    {:.2}", result.final_portfolio.cash);
    info!("Total return:  {:.4}%", result.total_return);
    info!("Sharpe ratio:  {:.4}", result.sharpe_ratio);
    info!("Max drawdown:  {:.4}%", result.max_drawdown);
    info!("========================================");

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&result)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path))?;
        info!("Result written to {}", path);
    }
    Ok(())
}

async fn run_live(config: &AppConfig) -> Result<()> {
    let api_key = env::var("BINANCE_API_KEY").unwrap_or_default();
    let secret_key = env::var("BINANCE_SECRET_KEY").unwrap_or_default();
    if api_key.is_empty() || secret_key.is_empty() {
        bail!("BINANCE_API_KEY and BINANCE_SECRET_KEY must be set for live trading");
    }

    info!("========================================");
    info!("Mode:    LIVE TRADING");
    info!("Symbols: {}", config.symbols.join(", "));
    info!("========================================");

    let client = BinanceClient::new(
        api_key,
        secret_key,
        config.exchange.base_url.clone(),
        config.symbols.clone(),
        config.quote_asset.clone(),
    );
    let mut engine = LiveEngine::new(Arc::new(client), Box::new(ThresholdStrategy::new()), config);

    engine.initialize().await?;
    engine.start()?;

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal, cleaning up...");
    if let Err(e) = engine.stop().await {
        error!("Shutdown error: {}", e);
    }

    let portfolio = engine.portfolio().await;
    info!(
        trades = engine.trades().await.len(),
        cash = %portfolio.cash,
        value = %portfolio.total_value(),
        "Session summary"
    );
    Ok(())
}
