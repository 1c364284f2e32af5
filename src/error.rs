//! Error types for price providers and the valuation core.

use std::time::Duration;

use thiserror::Error;

use crate::money::MoneyError;

/// Failure of a single price provider.
///
/// These never reach the caller of the valuation core: the resolver logs
/// them and moves on to the next provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider}: request failed: {source}")]
    Network {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider}: HTTP {status}")]
    Status {
        provider: &'static str,
        status: u16,
    },

    #[error("{provider}: rate limited")]
    RateLimited { provider: &'static str },

    #[error("{provider}: no price in response for {symbol}")]
    MissingPrice {
        provider: &'static str,
        symbol: String,
    },

    #[error("{provider}: invalid price {value:?}")]
    InvalidPrice {
        provider: &'static str,
        value: String,
    },

    #[error("{provider}: {message}")]
    Api {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: timed out after {after:?}")]
    Timeout {
        provider: &'static str,
        after: Duration,
    },
}

impl ProviderError {
    /// Whether a single retry of the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Network { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            ProviderError::RateLimited { .. } | ProviderError::Timeout { .. } => true,
            ProviderError::MissingPrice { .. }
            | ProviderError::InvalidPrice { .. }
            | ProviderError::Api { .. } => false,
        }
    }
}

/// Errors surfaced by the valuation core to its callers.
#[derive(Error, Debug)]
pub enum ValuationError {
    #[error("Trade {id} not found")]
    NotFound { id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No price available for {symbol}")]
    NoPrice { symbol: String },

    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] MoneyError),

    #[error("Corrupt trade record {id}: {reason}")]
    CorruptRecord { id: i64, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Status { provider: "x", status: 503 }.is_transient());
        assert!(ProviderError::Status { provider: "x", status: 429 }.is_transient());
        assert!(!ProviderError::Status { provider: "x", status: 404 }.is_transient());
        assert!(ProviderError::RateLimited { provider: "x" }.is_transient());
        assert!(!ProviderError::MissingPrice {
            provider: "x",
            symbol: "AAPL".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_display() {
        let err = ValuationError::NotFound { id: 42 };
        assert_eq!(err.to_string(), "Trade 42 not found");

        let err = ProviderError::Timeout {
            provider: "equity",
            after: Duration::from_secs(2),
        };
        assert_eq!(err.to_string(), "equity: timed out after 2s");
    }
}
