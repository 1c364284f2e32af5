//! Ordered, fail-open price resolution.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::api::{AlphaVantageProvider, CoinGeckoProvider};
use crate::config::MarketDataConfig;
use crate::error::{ProviderError, ValuationError};
use crate::models::{PriceQuote, Symbol};

use super::{PriceProvider, StaticPriceProvider};

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_CONCURRENCY: usize = 8;

/// Tries providers strictly in order and returns the first price found.
///
/// Provider failures and timeouts are logged and swallowed. With the static
/// fallback provider last in the chain every symbol resolves.
pub struct PriceResolver {
    providers: Vec<Arc<dyn PriceProvider>>,
    call_timeout: Duration,
    max_concurrency: usize,
}

impl PriceResolver {
    pub fn new(providers: Vec<Arc<dyn PriceProvider>>) -> Self {
        Self {
            providers,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            max_concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Standard chain: equity quotes, then crypto, then the static table.
    pub fn from_config(client: Client, config: &MarketDataConfig) -> Self {
        let providers: Vec<Arc<dyn PriceProvider>> = vec![
            Arc::new(AlphaVantageProvider::new(client.clone(), config)),
            Arc::new(CoinGeckoProvider::new(client, config)),
            Arc::new(StaticPriceProvider::default()),
        ];

        Self::new(providers)
            .with_call_timeout(config.lookup_timeout)
            .with_concurrency(config.max_concurrent_lookups)
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Resolve one symbol. Errors only if every provider in the chain failed.
    pub async fn resolve(&self, symbol: &Symbol) -> Result<PriceQuote, ValuationError> {
        for provider in &self.providers {
            match self.call(provider.as_ref(), symbol).await {
                Ok(quote) => {
                    debug!(
                        symbol = %symbol,
                        provider = provider.id(),
                        price = %quote.price,
                        source = %quote.source,
                        "Resolved price"
                    );
                    return Ok(quote);
                }
                Err(e) => {
                    warn!(
                        symbol = %symbol,
                        provider = provider.id(),
                        error = %e,
                        "Price provider failed, trying next"
                    );
                }
            }
        }

        Err(ValuationError::NoPrice {
            symbol: symbol.to_string(),
        })
    }

    async fn call(
        &self,
        provider: &dyn PriceProvider,
        symbol: &Symbol,
    ) -> Result<PriceQuote, ProviderError> {
        match timeout(self.call_timeout, provider.latest_price(symbol)).await {
            Ok(result) => {
                let quote = result?;
                if quote.price.is_positive() {
                    Ok(quote)
                } else {
                    Err(ProviderError::InvalidPrice {
                        provider: provider.id(),
                        value: quote.price.to_string(),
                    })
                }
            }
            Err(_) => Err(ProviderError::Timeout {
                provider: provider.id(),
                after: self.call_timeout,
            }),
        }
    }

    /// Resolve each distinct symbol once, concurrently.
    ///
    /// Results are keyed by symbol, so completion order never affects them.
    pub async fn resolve_many<'a, I>(
        &self,
        symbols: I,
    ) -> HashMap<Symbol, Result<PriceQuote, ValuationError>>
    where
        I: IntoIterator<Item = &'a Symbol>,
    {
        let distinct: BTreeSet<&Symbol> = symbols.into_iter().collect();
        debug!(count = distinct.len(), "Resolving prices");

        stream::iter(distinct)
            .map(|symbol| async move { (symbol.clone(), self.resolve(symbol).await) })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::QuoteSource;
    use crate::money::Money;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that prices a fixed set of symbols and fails on the rest.
    pub(crate) struct MockProvider {
        id: &'static str,
        source: QuoteSource,
        price: Money,
        known: Option<HashSet<String>>,
        delay: Option<Duration>,
        pub(crate) call_count: AtomicUsize,
    }

    impl MockProvider {
        pub(crate) fn pricing_all(id: &'static str, source: QuoteSource, price: Money) -> Self {
            Self {
                id,
                source,
                price,
                known: None,
                delay: None,
                call_count: AtomicUsize::new(0),
            }
        }

        pub(crate) fn pricing(
            id: &'static str,
            source: QuoteSource,
            price: Money,
            symbols: &[&str],
        ) -> Self {
            Self {
                known: Some(symbols.iter().map(|s| s.to_string()).collect()),
                ..Self::pricing_all(id, source, price)
            }
        }

        pub(crate) fn failing(id: &'static str) -> Self {
            Self::pricing(id, QuoteSource::Equity, Money::ZERO, &[])
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceProvider for MockProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        async fn latest_price(&self, symbol: &Symbol) -> Result<PriceQuote, ProviderError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let priced = self
                .known
                .as_ref()
                .map_or(true, |known| known.contains(symbol.as_str()));
            if priced {
                Ok(PriceQuote::new(symbol.clone(), self.price, self.source))
            } else {
                Err(ProviderError::MissingPrice {
                    provider: self.id,
                    symbol: symbol.to_string(),
                })
            }
        }
    }

    fn sym(s: &str) -> Symbol {
        Symbol::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let equity = Arc::new(MockProvider::pricing_all(
            "equity",
            QuoteSource::Equity,
            Money::from(dec!(187.20)),
        ));
        let crypto = Arc::new(MockProvider::pricing_all(
            "crypto",
            QuoteSource::Crypto,
            Money::from(dec!(1)),
        ));
        let fallback = Arc::new(MockProvider::pricing_all(
            "fallback",
            QuoteSource::Fallback,
            Money::from(dec!(150.00)),
        ));
        let resolver =
            PriceResolver::new(vec![equity.clone(), crypto.clone(), fallback.clone()]);

        let quote = resolver.resolve(&sym("AAPL")).await.unwrap();

        assert_eq!(quote.price, Money::from(dec!(187.20)));
        assert_eq!(quote.source, QuoteSource::Equity);
        assert_eq!(equity.calls(), 1);
        assert_eq!(crypto.calls(), 0);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_through_in_order() {
        let equity = Arc::new(MockProvider::failing("equity"));
        let crypto = Arc::new(MockProvider::pricing(
            "crypto",
            QuoteSource::Crypto,
            Money::from(dec!(64000.5)),
            &["BITCOIN"],
        ));
        let resolver = PriceResolver::new(vec![
            equity.clone(),
            crypto.clone(),
            Arc::new(StaticPriceProvider::default()),
        ]);

        let quote = resolver.resolve(&sym("bitcoin")).await.unwrap();
        assert_eq!(quote.source, QuoteSource::Crypto);
        assert_eq!(quote.price, Money::from(dec!(64000.5)));

        let quote = resolver.resolve(&sym("ZZZ")).await.unwrap();
        assert_eq!(quote.source, QuoteSource::FallbackDefault);
        assert_eq!(quote.price.to_string(), "100.00");

        assert_eq!(equity.calls(), 2);
        assert_eq!(crypto.calls(), 2);
    }

    #[tokio::test]
    async fn test_timeout_moves_to_next_provider() {
        let slow = Arc::new(
            MockProvider::pricing_all("equity", QuoteSource::Equity, Money::from(dec!(1)))
                .slow(Duration::from_secs(5)),
        );
        let resolver = PriceResolver::new(vec![slow.clone(), Arc::new(StaticPriceProvider::default())])
            .with_call_timeout(Duration::from_millis(20));

        let quote = resolver.resolve(&sym("TSLA")).await.unwrap();
        assert_eq!(quote.source, QuoteSource::Fallback);
        assert_eq!(quote.price, Money::from(dec!(250.00)));
        assert_eq!(slow.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_positive_price_is_a_failure() {
        let zero = Arc::new(MockProvider::pricing_all(
            "equity",
            QuoteSource::Equity,
            Money::ZERO,
        ));
        let resolver = PriceResolver::new(vec![zero, Arc::new(StaticPriceProvider::default())]);

        let quote = resolver.resolve(&sym("ETH")).await.unwrap();
        assert_eq!(quote.source, QuoteSource::Fallback);
        assert_eq!(quote.price, Money::from(dec!(3000.00)));
    }

    #[tokio::test]
    async fn test_chain_without_fallback_can_fail() {
        let resolver = PriceResolver::new(vec![Arc::new(MockProvider::failing("equity"))]);
        let result = resolver.resolve(&sym("AAPL")).await;
        assert!(matches!(result, Err(ValuationError::NoPrice { .. })));
    }

    #[tokio::test]
    async fn test_resolve_many_deduplicates() {
        let equity = Arc::new(MockProvider::pricing_all(
            "equity",
            QuoteSource::Equity,
            Money::from(dec!(10)),
        ));
        let resolver = PriceResolver::new(vec![equity.clone()]).with_concurrency(2);

        let symbols = vec![sym("AAPL"), sym("MSFT"), sym("aapl"), sym("GOOGL")];
        let prices = resolver.resolve_many(&symbols).await;

        assert_eq!(prices.len(), 3);
        assert_eq!(equity.calls(), 3);
        assert!(prices.values().all(|r| r.is_ok()));
    }
}
