//! Equity quotes from Alpha Vantage `GLOBAL_QUOTE`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::MarketDataConfig;
use crate::error::ProviderError;
use crate::models::{PriceQuote, QuoteSource, Symbol};
use crate::money::Money;
use crate::pricing::PriceProvider;

use super::http::{check_status, parse_price, with_single_retry};
use super::types::GlobalQuoteResponse;

pub const PROVIDER_ID: &str = "equity";

/// Looks the symbol up as a stock ticker.
pub struct AlphaVantageProvider {
    client: Client,
    base_url: String,
    api_key: String,
    retry_budget: Duration,
}

impl AlphaVantageProvider {
    pub fn new(client: Client, config: &MarketDataConfig) -> Self {
        Self {
            client,
            base_url: config.alpha_vantage_base_url.clone(),
            api_key: config.alpha_vantage_api_key.clone(),
            retry_budget: config.lookup_timeout,
        }
    }

    async fn fetch_price(&self, symbol: &Symbol) -> Result<Money, ProviderError> {
        debug!(symbol = %symbol, "Fetching equity quote");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol.ticker()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|source| ProviderError::Network {
                provider: PROVIDER_ID,
                source,
            })?;

        let body: GlobalQuoteResponse = check_status(PROVIDER_ID, response)?
            .json()
            .await
            .map_err(|source| ProviderError::Network {
                provider: PROVIDER_ID,
                source,
            })?;

        extract_price(symbol, body)
    }
}

/// Pull `"05. price"` out of a `GLOBAL_QUOTE` body.
pub(crate) fn extract_price(
    symbol: &Symbol,
    body: GlobalQuoteResponse,
) -> Result<Money, ProviderError> {
    if let Some(message) = body.error_message {
        return Err(ProviderError::Api {
            provider: PROVIDER_ID,
            message,
        });
    }

    let price = body.global_quote.and_then(|q| q.price);
    match (price, body.note.or(body.information)) {
        (Some(raw), _) => parse_price(PROVIDER_ID, &raw),
        (None, Some(message)) => {
            if message.contains("call frequency") || message.contains("rate limit") {
                Err(ProviderError::RateLimited {
                    provider: PROVIDER_ID,
                })
            } else {
                warn!(symbol = %symbol, message = %message, "Alpha Vantage notice");
                Err(ProviderError::Api {
                    provider: PROVIDER_ID,
                    message,
                })
            }
        }
        (None, None) => Err(ProviderError::MissingPrice {
            provider: PROVIDER_ID,
            symbol: symbol.to_string(),
        }),
    }
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn latest_price(&self, symbol: &Symbol) -> Result<PriceQuote, ProviderError> {
        let price =
            with_single_retry(PROVIDER_ID, self.retry_budget, || self.fetch_price(symbol)).await?;
        Ok(PriceQuote::new(symbol.clone(), price, QuoteSource::Equity))
    }
}
