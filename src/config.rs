//! Market data configuration.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";
pub const COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";

/// Endpoints, credentials and limits for price lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataConfig {
    /// Alpha Vantage API key
    pub alpha_vantage_api_key: String,

    /// Alpha Vantage query endpoint
    pub alpha_vantage_base_url: String,

    /// CoinGecko API root
    pub coingecko_base_url: String,

    /// Timeout applied to each HTTP request
    pub request_timeout: Duration,

    /// Upper bound the resolver puts on one provider call, retries included
    pub lookup_timeout: Duration,

    /// Maximum symbols looked up at once
    pub max_concurrent_lookups: usize,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            alpha_vantage_api_key: "demo".to_string(),
            alpha_vantage_base_url: ALPHA_VANTAGE_URL.to_string(),
            coingecko_base_url: COINGECKO_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            lookup_timeout: Duration::from_secs(15),
            max_concurrent_lookups: 8,
        }
    }
}

impl MarketDataConfig {
    /// Load from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let request_timeout = match non_empty("MARKET_DATA_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.trim()
                    .parse()
                    .context("MARKET_DATA_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => defaults.request_timeout,
        };

        let lookup_timeout = match non_empty("PRICE_LOOKUP_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.trim()
                    .parse()
                    .context("PRICE_LOOKUP_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => defaults.lookup_timeout,
        };

        let max_concurrent_lookups = match non_empty("PRICE_LOOKUP_CONCURRENCY") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .context("PRICE_LOOKUP_CONCURRENCY must be a positive integer")?
                .max(1),
            None => defaults.max_concurrent_lookups,
        };

        Ok(Self {
            alpha_vantage_api_key: non_empty("ALPHA_VANTAGE_API_KEY")
                .unwrap_or(defaults.alpha_vantage_api_key),
            alpha_vantage_base_url: non_empty("ALPHA_VANTAGE_BASE_URL")
                .unwrap_or(defaults.alpha_vantage_base_url),
            coingecko_base_url: non_empty("COINGECKO_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.coingecko_base_url),
            request_timeout,
            lookup_timeout,
            max_concurrent_lookups,
        })
    }
}
