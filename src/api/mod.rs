//! HTTP clients for live equity and crypto prices.

mod alpha_vantage;
mod coingecko;
mod http;
mod types;

pub use alpha_vantage::AlphaVantageProvider;
pub use coingecko::CoinGeckoProvider;
pub use http::build_client;
