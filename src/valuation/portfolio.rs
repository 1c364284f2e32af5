//! Portfolio totals over an owner's full trade list.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::error::ValuationError;
use crate::models::{Holding, PortfolioSummary, PriceQuote, Symbol, Trade, TradeType};
use crate::money::{Money, MoneyError};
use crate::pricing::PriceResolver;

use super::engine::profit_loss;

/// Resolve prices for every distinct symbol, then fold the trades into totals.
pub async fn aggregate(
    trades: &[Trade],
    resolver: &PriceResolver,
) -> Result<PortfolioSummary, MoneyError> {
    let prices = resolver.resolve_many(trades.iter().map(|t| &t.symbol)).await;
    summarize(trades, &prices)
}

/// Fold trades and already-resolved prices into a [`PortfolioSummary`].
///
/// Invested and sold totals depend only on the trades. Every trade, BUY or
/// SELL, adds its notional at the current price and its unrealized P/L; a
/// trade whose price is missing, or whose contribution overflows, adds zero
/// to both and the fold goes on. Only an overflow of the recorded totals
/// fails the whole summary.
pub fn summarize(
    trades: &[Trade],
    prices: &HashMap<Symbol, Result<PriceQuote, ValuationError>>,
) -> Result<PortfolioSummary, MoneyError> {
    let mut summary = PortfolioSummary {
        trade_count: trades.len(),
        ..PortfolioSummary::default()
    };

    for trade in trades {
        let total = match trade.trade_type {
            TradeType::Buy => &mut summary.total_invested,
            TradeType::Sell => &mut summary.total_sold,
        };
        *total = total
            .checked_add(trade.total_amount)
            .ok_or(MoneyError::Overflow)?;

        let quote = match prices.get(&trade.symbol) {
            Some(Ok(quote)) if quote.price.is_positive() => quote,
            _ => {
                debug!(trade_id = trade.id, symbol = %trade.symbol, "No price, trade contributes zero");
                summary.unpriced_trades += 1;
                continue;
            }
        };

        let totals = contribution(trade, quote.price).and_then(|(value, pl)| {
            Some((
                summary.current_value.checked_add(value)?,
                summary.total_profit_loss.checked_add(pl)?,
            ))
        });
        match totals {
            Some((current_value, total_profit_loss)) => {
                summary.current_value = current_value;
                summary.total_profit_loss = total_profit_loss;
                if !quote.is_live() {
                    summary.indicative_trades += 1;
                }
            }
            None => {
                warn!(trade_id = trade.id, symbol = %trade.symbol, "Trade valuation overflowed, skipping");
                summary.unpriced_trades += 1;
            }
        }
    }

    Ok(summary)
}

/// Current notional and unrealized P/L of one trade.
fn contribution(trade: &Trade, current_price: Money) -> Option<(Money, Money)> {
    let value = current_price.checked_mul(trade.quantity)?;
    let pl = profit_loss(trade.price_per_unit, current_price, trade.quantity)?;
    Some((value, pl))
}

/// Total recorded quantity per symbol, regardless of side, ordered by symbol.
pub fn holdings(trades: &[Trade]) -> Result<Vec<Holding>, MoneyError> {
    let mut by_symbol: BTreeMap<&Symbol, (Money, usize)> = BTreeMap::new();
    for trade in trades {
        let entry = by_symbol.entry(&trade.symbol).or_insert((Money::ZERO, 0));
        entry.0 = entry
            .0
            .checked_add(trade.quantity)
            .ok_or(MoneyError::Overflow)?;
        entry.1 += 1;
    }

    Ok(by_symbol
        .into_iter()
        .map(|(symbol, (total_quantity, trade_count))| Holding {
            symbol: symbol.clone(),
            total_quantity,
            trade_count,
        })
        .collect())
}
