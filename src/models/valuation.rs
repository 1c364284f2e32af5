//! Derived, never-stored valuation figures.

use serde::{Deserialize, Serialize};

use crate::money::Money;

use super::{QuoteSource, Symbol, TradeType};

/// Profit/loss of one trade at a resolved current price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub trade_id: i64,
    pub symbol: Symbol,
    pub trade_type: TradeType,
    pub quantity: Money,
    pub entry_price: Money,
    pub current_price: Money,
    /// Where `current_price` came from
    pub price_source: QuoteSource,
    /// (current - entry) x quantity, unrounded
    pub profit_loss: Money,
    /// Ratio rounded half-up to 4 places, then x100
    pub profit_loss_percentage: Money,
}

impl ValuationResult {
    /// True when the price is not a live market quote.
    pub fn is_indicative(&self) -> bool {
        !self.price_source.is_live()
    }
}

/// Portfolio-level totals for one owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_invested: Money,
    pub total_sold: Money,
    pub current_value: Money,
    pub total_profit_loss: Money,
    pub trade_count: usize,
    /// Trades whose price could not be resolved and contributed zero
    pub unpriced_trades: usize,
    /// Trades priced from the fallback table rather than a live quote
    pub indicative_trades: usize,
}

/// Total quantity recorded per symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: Symbol,
    pub total_quantity: Money,
    pub trade_count: usize,
}
