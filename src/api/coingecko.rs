//! Crypto prices from CoinGecko `/simple/price`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::MarketDataConfig;
use crate::error::ProviderError;
use crate::models::{PriceQuote, QuoteSource, Symbol};
use crate::money::Money;
use crate::pricing::PriceProvider;

use super::http::{check_status, parse_price, with_single_retry};
use super::types::SimplePriceResponse;

pub const PROVIDER_ID: &str = "crypto";
const VS_CURRENCY: &str = "usd";

/// Looks the lowercased symbol up as a coin id, priced in USD.
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    retry_budget: Duration,
}

impl CoinGeckoProvider {
    pub fn new(client: Client, config: &MarketDataConfig) -> Self {
        Self {
            client,
            base_url: config.coingecko_base_url.clone(),
            retry_budget: config.lookup_timeout,
        }
    }

    async fn fetch_price(&self, symbol: &Symbol) -> Result<Money, ProviderError> {
        let coin_id = symbol.coin_id();
        let url = format!("{}/simple/price", self.base_url);

        debug!(url = %url, coin = %coin_id, "Fetching crypto price");

        let response = self
            .client
            .get(&url)
            .query(&[("ids", coin_id.as_str()), ("vs_currencies", VS_CURRENCY)])
            .send()
            .await
            .map_err(|source| ProviderError::Network {
                provider: PROVIDER_ID,
                source,
            })?;

        let body: SimplePriceResponse = check_status(PROVIDER_ID, response)?
            .json()
            .await
            .map_err(|source| ProviderError::Network {
                provider: PROVIDER_ID,
                source,
            })?;

        extract_price(&coin_id, &body)
    }
}

pub(crate) fn extract_price(
    coin_id: &str,
    body: &SimplePriceResponse,
) -> Result<Money, ProviderError> {
    let price = body
        .get(coin_id)
        .and_then(|prices| prices.get(VS_CURRENCY))
        .ok_or_else(|| ProviderError::MissingPrice {
            provider: PROVIDER_ID,
            symbol: coin_id.to_string(),
        })?;

    parse_price(PROVIDER_ID, &price.to_string())
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn latest_price(&self, symbol: &Symbol) -> Result<PriceQuote, ProviderError> {
        let price =
            with_single_retry(PROVIDER_ID, self.retry_budget, || self.fetch_price(symbol)).await?;
        Ok(PriceQuote::new(symbol.clone(), price, QuoteSource::Crypto))
    }
}
