//! Static indicative prices used when no live quote is available.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal_macros::dec;

use crate::error::ProviderError;
use crate::models::{PriceQuote, QuoteSource, Symbol};
use crate::money::Money;

use super::PriceProvider;

pub const PROVIDER_ID: &str = "fallback";

/// Price for any symbol missing from the table.
pub const DEFAULT_PRICE: Money = Money::from_decimal(dec!(100.00));

/// Deterministic lookup table. Never fails.
#[derive(Debug, Clone)]
pub struct StaticPriceProvider {
    prices: HashMap<String, Money>,
    default_price: Money,
}

impl StaticPriceProvider {
    pub fn new(prices: HashMap<String, Money>, default_price: Money) -> Self {
        let prices = prices
            .into_iter()
            .map(|(symbol, price)| (symbol.to_uppercase(), price))
            .collect();
        Self {
            prices,
            default_price,
        }
    }

    pub fn quote(&self, symbol: &Symbol) -> PriceQuote {
        match self.prices.get(symbol.ticker()) {
            Some(price) => PriceQuote::new(symbol.clone(), *price, QuoteSource::Fallback),
            None => PriceQuote::new(
                symbol.clone(),
                self.default_price,
                QuoteSource::FallbackDefault,
            ),
        }
    }
}

impl Default for StaticPriceProvider {
    fn default() -> Self {
        let prices = [
            ("AAPL", dec!(150.00)),
            ("GOOGL", dec!(2800.00)),
            ("MSFT", dec!(300.00)),
            ("TSLA", dec!(250.00)),
            ("AMZN", dec!(3300.00)),
            ("BTC", dec!(45000.00)),
            ("ETH", dec!(3000.00)),
            ("ADA", dec!(1.50)),
            ("DOT", dec!(25.00)),
        ]
        .into_iter()
        .map(|(symbol, price)| (symbol.to_string(), Money::from(price)))
        .collect();

        Self::new(prices, DEFAULT_PRICE)
    }
}

#[async_trait]
impl PriceProvider for StaticPriceProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn latest_price(&self, symbol: &Symbol) -> Result<PriceQuote, ProviderError> {
        Ok(self.quote(symbol))
    }
}
