//! Personal Finance Tracker
//!
//! Records buy/sell trades and values them against live equity and crypto
//! quotes, falling back to an indicative price table when providers fail.

mod api;
mod config;
mod db;
mod error;
mod models;
mod money;
mod pricing;
mod service;
mod valuation;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::api::build_client;
use crate::config::MarketDataConfig;
use crate::db::{Database, TradeFilter, TradeStore};
use crate::models::{AssetType, NewTrade, Symbol, TradeType};
use crate::money::Money;
use crate::pricing::PriceResolver;
use crate::service::ValuationService;

/// Personal finance tracker CLI.
#[derive(Parser)]
#[command(name = "fintrack")]
#[command(about = "Track trades and value them at current market prices", long_about = None)]
struct Cli {
    /// Database file path
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:./fintrack.db?mode=rwc")]
    database: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Owner whose trades are read and written
    #[arg(short, long, default_value = "1")]
    owner: i64,

    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current price of a symbol
    Price {
        /// Ticker or coin id (e.g. AAPL, bitcoin)
        symbol: String,
    },

    /// Record a trade
    Add {
        /// Ticker or coin id
        symbol: String,

        /// BUY or SELL
        #[arg(short, long)]
        side: TradeType,

        /// Units traded
        #[arg(short, long)]
        quantity: Money,

        /// Price per unit
        #[arg(short, long)]
        price: Money,

        /// Asset class (STOCK, CRYPTO, FOREX, ...)
        #[arg(short, long, default_value = "STOCK")]
        asset_type: String,

        /// Fees paid
        #[arg(long)]
        fees: Option<Money>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,

        /// Trade date (YYYY-MM-DD or RFC 3339), defaults to now
        #[arg(long, value_parser = parse_date)]
        date: Option<DateTime<Utc>>,
    },

    /// Delete a recorded trade
    Remove {
        /// Trade id
        id: i64,
    },

    /// List trades with their current profit/loss
    Trades {
        /// Only this symbol
        #[arg(short, long)]
        symbol: Option<String>,

        /// Only this asset class
        #[arg(short, long)]
        asset_type: Option<String>,

        /// Trades on or after this date
        #[arg(long, value_parser = parse_date)]
        from: Option<DateTime<Utc>>,

        /// Trades on or before this date
        #[arg(long, value_parser = parse_date)]
        to: Option<DateTime<Utc>>,
    },

    /// Show one trade with its current profit/loss
    Trade {
        /// Trade id
        id: i64,
    },

    /// Show portfolio totals
    Portfolio,

    /// Show total quantity per symbol
    Holdings,

    /// Show current market data configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = MarketDataConfig::from_env()?;

    // Initialize database and price chain
    let db = Database::new(&cli.database).await?;
    let client = build_client(config.request_timeout)?;
    let resolver = PriceResolver::from_config(client, &config);
    let service = ValuationService::new(db, resolver);
    let owner = cli.owner;

    match cli.command {
        Commands::Price { symbol } => {
            let quote = service.resolve_current_price(&symbol).await?;

            if cli.json {
                return print_json(&quote);
            }
            println!("\n{:<12} {:>14} {:<18}", "SYMBOL", "PRICE", "SOURCE");
            println!("{}", "-".repeat(46));
            println!(
                "{:<12} {:>14} {:<18}",
                quote.symbol,
                quote.price.round_currency(),
                quote.source
            );
            if !quote.is_live() {
                println!("\nNote: not a live market quote.");
            }
        }

        Commands::Add {
            symbol,
            side,
            quantity,
            price,
            asset_type,
            fees,
            notes,
            date,
        } => {
            let new_trade = NewTrade {
                symbol,
                asset_type,
                trade_type: side,
                quantity,
                price_per_unit: price,
                fees,
                notes,
                trade_date: date,
            };
            let trade = service.store().insert_trade(owner, &new_trade).await?;
            info!(id = trade.id, symbol = %trade.symbol, "Trade recorded");

            if cli.json {
                return print_json(&trade);
            }
            println!(
                "Recorded trade {}: {} {} {} @ {} (total {})",
                trade.id,
                trade.trade_type,
                trade.quantity.amount().normalize(),
                trade.symbol,
                trade.price_per_unit,
                trade.total_amount
            );
        }

        Commands::Remove { id } => {
            service.store().delete_trade(owner, id).await?;
            info!(id, "Trade removed");
            println!("Removed trade {}", id);
        }

        Commands::Trades {
            symbol,
            asset_type,
            from,
            to,
        } => {
            let filter = TradeFilter {
                symbol: symbol.as_deref().map(Symbol::parse).transpose()?,
                asset_type: asset_type
                    .as_deref()
                    .map(str::parse::<AssetType>)
                    .transpose()?,
                from,
                to,
            };
            let results = service.valuate_trades(owner, &filter).await?;

            if cli.json {
                return print_json(&results);
            }
            if results.is_empty() {
                println!("No trades recorded. Use 'fintrack add' to record one.");
                return Ok(());
            }

            println!(
                "\n{:>6} {:<10} {:<5} {:>16} {:>12} {:>12} {:>14} {:>9} {:<16}",
                "ID", "SYMBOL", "SIDE", "QTY", "ENTRY", "CURRENT", "P&L", "P&L%", "SOURCE"
            );
            println!("{}", "-".repeat(108));

            for r in &results {
                println!(
                    "{:>6} {:<10} {:<5} {:>16} {:>12} {:>12} {:>14} {:>8}% {:<16}",
                    r.trade_id,
                    truncate(r.symbol.as_str(), 10),
                    r.trade_type,
                    r.quantity.amount().normalize(),
                    r.entry_price,
                    r.current_price.round_currency(),
                    r.profit_loss.round_currency(),
                    r.profit_loss_percentage.round_currency(),
                    r.price_source
                );
            }
        }

        Commands::Trade { id } => {
            let trade = service.store().get_trade(owner, id).await?;
            let result = service.valuate(&trade).await;

            if cli.json {
                #[derive(Serialize)]
                struct TradeDetail<'a> {
                    trade: &'a models::Trade,
                    valuation: &'a models::ValuationResult,
                }
                return print_json(&TradeDetail {
                    trade: &trade,
                    valuation: &result,
                });
            }

            println!("\n=== Trade {} ===", trade.id);
            println!("Symbol:         {}", trade.symbol);
            println!("Asset Type:     {}", trade.asset_type);
            println!("Side:           {}", trade.trade_type);
            println!("Quantity:       {}", trade.quantity.amount().normalize());
            println!("Entry Price:    ${}", trade.price_per_unit);
            println!("Total Amount:   ${}", trade.total_amount);
            println!("Fees:           ${}", trade.fees);
            println!("Date:           {}", trade.trade_date.format("%Y-%m-%d %H:%M:%S UTC"));
            if let Some(notes) = &trade.notes {
                println!("Notes:          {}", notes);
            }

            println!("\n--- Valuation ---");
            println!("Current Price:  ${} ({})", result.current_price.round_currency(), result.price_source);
            println!("P&L:            ${}", result.profit_loss.round_currency());
            println!("P&L %:          {}%", result.profit_loss_percentage.round_currency());
            if result.is_indicative() {
                println!("\nNote: valued at an indicative price, not a live quote.");
            }
        }

        Commands::Portfolio => {
            let summary = service.summarize_portfolio(owner).await?;

            if cli.json {
                return print_json(&summary);
            }

            println!("\n=== Portfolio ===");
            println!("Trades:           {}", summary.trade_count);
            println!("Total Invested:   ${}", summary.total_invested.round_currency());
            println!("Total Sold:       ${}", summary.total_sold.round_currency());
            println!("Current Value:    ${}", summary.current_value.round_currency());
            println!("Total P&L:        ${}", summary.total_profit_loss.round_currency());

            if summary.unpriced_trades > 0 {
                println!("\n{} trade(s) could not be priced and count as zero.", summary.unpriced_trades);
            }
            if summary.indicative_trades > 0 {
                println!("{} trade(s) valued at indicative fallback prices.", summary.indicative_trades);
            }
        }

        Commands::Holdings => {
            let holdings = service.holdings(owner).await?;

            if cli.json {
                return print_json(&holdings);
            }
            if holdings.is_empty() {
                println!("No trades recorded. Use 'fintrack add' to record one.");
                return Ok(());
            }

            println!("\n{:<12} {:>20} {:>8}", "SYMBOL", "QUANTITY", "TRADES");
            println!("{}", "-".repeat(42));
            for h in &holdings {
                println!(
                    "{:<12} {:>20} {:>8}",
                    truncate(h.symbol.as_str(), 12),
                    h.total_quantity.amount().normalize(),
                    h.trade_count
                );
            }
        }

        Commands::Config => print_config(&config, &service.resolver().provider_ids(), cli.json)?,
    }

    Ok(())
}

fn print_config(config: &MarketDataConfig, chain: &[&str], json: bool) -> Result<()> {
    let masked = MarketDataConfig {
        alpha_vantage_api_key: mask(&config.alpha_vantage_api_key),
        ..config.clone()
    };
    if json {
        #[derive(Serialize)]
        struct ConfigView<'a> {
            #[serde(flatten)]
            market_data: &'a MarketDataConfig,
            price_chain: &'a [&'a str],
        }
        return print_json(&ConfigView {
            market_data: &masked,
            price_chain: chain,
        });
    }

    println!("\n=== Market Data Configuration ===\n");
    println!("Price Chain:            {}", chain.join(" -> "));

    println!("Equity Provider:");
    println!("  Endpoint:             {}", masked.alpha_vantage_base_url);
    println!("  API Key:              {}", masked.alpha_vantage_api_key);

    println!("\nCrypto Provider:");
    println!("  Endpoint:             {}", masked.coingecko_base_url);

    println!("\nLimits:");
    println!("  Request Timeout:      {}s", masked.request_timeout.as_secs());
    println!("  Lookup Timeout:       {}s", masked.lookup_timeout.as_secs());
    println!("  Concurrent Lookups:   {}", masked.max_concurrent_lookups);
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
fn parse_date(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid date {s:?}, expected YYYY-MM-DD or RFC 3339"))
}

fn mask(secret: &str) -> String {
    if secret.chars().count() <= 4 {
        secret.to_string()
    } else {
        let tail: String = secret.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
        format!("****{}", tail)
    }
}

/// Truncate a string with ellipsis if too long.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
