//! Valuation entry points over stored trades.

use tracing::{debug, info};

use crate::db::{TradeFilter, TradeStore};
use crate::error::ValuationError;
use crate::models::{Holding, PortfolioSummary, PriceQuote, Symbol, Trade, ValuationResult};
use crate::pricing::PriceResolver;
use crate::valuation;

/// Values an owner's trades against current prices.
///
/// Prices are resolved on every call and never cached or persisted.
pub struct ValuationService<S> {
    store: S,
    resolver: PriceResolver,
}

impl<S: TradeStore> ValuationService<S> {
    pub fn new(store: S, resolver: PriceResolver) -> Self {
        Self { store, resolver }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn resolver(&self) -> &PriceResolver {
        &self.resolver
    }

    /// Current price for a symbol.
    ///
    /// If the whole chain fails the quote is zero with source `unavailable`.
    pub async fn resolve_current_price(&self, symbol: &str) -> Result<PriceQuote, ValuationError> {
        let symbol = Symbol::parse(symbol)?;
        match self.resolver.resolve(&symbol).await {
            Ok(quote) => Ok(quote),
            Err(ValuationError::NoPrice { .. }) => Ok(PriceQuote::unavailable(symbol)),
            Err(e) => Err(e),
        }
    }

    /// Value a trade already in hand at its symbol's current price.
    pub async fn valuate(&self, trade: &Trade) -> ValuationResult {
        let result = match self.resolver.resolve(&trade.symbol).await {
            Ok(quote) => valuation::valuate(trade, &quote),
            Err(_) => valuation::unpriced(trade),
        };

        debug!(
            trade_id = trade.id,
            symbol = %result.symbol,
            profit_loss = %result.profit_loss,
            source = %result.price_source,
            "Valued trade"
        );
        result
    }

    /// Value one stored trade.
    pub async fn valuate_trade(&self, owner_id: i64, id: i64) -> Result<ValuationResult, ValuationError> {
        let trade = self.store.get_trade(owner_id, id).await?;
        Ok(self.valuate(&trade).await)
    }

    /// Value every trade matching `filter`, in listing order.
    ///
    /// Each distinct symbol is priced once. Trades with no price are
    /// reported with zero figures rather than failing the list.
    pub async fn valuate_trades(
        &self,
        owner_id: i64,
        filter: &TradeFilter,
    ) -> Result<Vec<ValuationResult>, ValuationError> {
        let trades = self.store.list_trades_filtered(owner_id, filter).await?;
        let prices = self
            .resolver
            .resolve_many(trades.iter().map(|t| &t.symbol))
            .await;

        Ok(trades
            .iter()
            .map(|trade| match prices.get(&trade.symbol) {
                Some(Ok(quote)) => valuation::valuate(trade, quote),
                _ => valuation::unpriced(trade),
            })
            .collect())
    }

    /// Totals across all of the owner's trades.
    pub async fn summarize_portfolio(&self, owner_id: i64) -> Result<PortfolioSummary, ValuationError> {
        let trades = self.store.list_trades(owner_id).await?;
        let summary = valuation::aggregate(&trades, &self.resolver).await?;

        info!(
            owner_id,
            trades = summary.trade_count,
            unpriced = summary.unpriced_trades,
            current_value = %summary.current_value,
            "Portfolio summarized"
        );
        Ok(summary)
    }

    /// Quantity per symbol across all of the owner's trades.
    pub async fn holdings(&self, owner_id: i64) -> Result<Vec<Holding>, ValuationError> {
        let trades = self.store.list_trades(owner_id).await?;
        Ok(valuation::holdings(&trades)?)
    }
}
