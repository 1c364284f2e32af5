//! Response types for the equity and crypto quote APIs.

use std::collections::HashMap;

use serde::Deserialize;

/// Alpha Vantage `GLOBAL_QUOTE` response.
///
/// Unknown symbols come back as an empty `"Global Quote": {}`; throttled
/// requests carry only `"Note"` or `"Information"`.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    pub global_quote: Option<GlobalQuote>,
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,
    #[serde(rename = "Note")]
    pub note: Option<String>,
    #[serde(rename = "Information")]
    pub information: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalQuote {
    #[serde(rename = "05. price", default)]
    pub price: Option<String>,
}

/// CoinGecko `/simple/price` response: coin id -> currency -> price.
pub type SimplePriceResponse = HashMap<String, HashMap<String, serde_json::Number>>;
