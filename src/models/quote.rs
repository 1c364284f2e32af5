//! Resolved price quotes and their provenance.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

use super::Symbol;

/// Which provider produced a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuoteSource {
    /// Live equity quote
    Equity,
    /// Live crypto market data
    Crypto,
    /// Indicative price from the static table
    Fallback,
    /// Symbol not in the static table; fixed default price
    FallbackDefault,
    /// No provider produced a price; value is zero
    Unavailable,
}

impl QuoteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteSource::Equity => "equity",
            QuoteSource::Crypto => "crypto",
            QuoteSource::Fallback => "fallback",
            QuoteSource::FallbackDefault => "fallback-default",
            QuoteSource::Unavailable => "unavailable",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, QuoteSource::Equity | QuoteSource::Crypto)
    }
}

impl fmt::Display for QuoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A current price for a symbol, tagged with its origin. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: Symbol,
    pub price: Money,
    pub source: QuoteSource,
    pub fetched_at: DateTime<Utc>,
}

impl PriceQuote {
    pub fn new(symbol: Symbol, price: Money, source: QuoteSource) -> Self {
        Self {
            symbol,
            price,
            source,
            fetched_at: Utc::now(),
        }
    }

    /// Zero-priced placeholder for a symbol nothing could price.
    pub fn unavailable(symbol: Symbol) -> Self {
        Self::new(symbol, Money::ZERO, QuoteSource::Unavailable)
    }

    pub fn is_live(&self) -> bool {
        self.source.is_live()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_tags() {
        assert_eq!(QuoteSource::FallbackDefault.to_string(), "fallback-default");
        assert_eq!(
            serde_json::to_string(&QuoteSource::FallbackDefault).unwrap(),
            "\"fallback-default\""
        );
        assert!(QuoteSource::Crypto.is_live());
        assert!(!QuoteSource::Fallback.is_live());
    }

    #[test]
    fn test_unavailable_quote() {
        let quote = PriceQuote::unavailable(Symbol::parse("xyz").unwrap());
        assert_eq!(quote.price, Money::ZERO);
        assert_eq!(quote.source, QuoteSource::Unavailable);
        assert!(!quote.is_live());
    }
}
