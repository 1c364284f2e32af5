//! Shared HTTP client and single-retry helper for quote providers.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use backoff::ExponentialBackoffBuilder;
use reqwest::{Client, Response};
use tracing::warn;

use crate::error::ProviderError;
use crate::money::Money;

const RETRY_INITIAL_INTERVAL: Duration = Duration::from_millis(250);

/// Build the process-wide HTTP client. Clone it into each provider.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .user_agent(concat!("fintrack/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

/// Run `op`, retrying once if the first failure is transient.
///
/// The retry is abandoned once `budget` has elapsed.
pub async fn with_single_retry<T, F, Fut>(
    provider: &'static str,
    budget: Duration,
    mut op: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(RETRY_INITIAL_INTERVAL)
        .with_max_elapsed_time(Some(budget))
        .build();

    let mut attempt = 0u32;
    backoff::future::retry_notify(
        policy,
        || {
            attempt += 1;
            let first_attempt = attempt == 1;
            let request = op();
            async move {
                request.await.map_err(|e| {
                    if first_attempt && e.is_transient() {
                        backoff::Error::transient(e)
                    } else {
                        backoff::Error::permanent(e)
                    }
                })
            }
        },
        |e: ProviderError, wait: Duration| {
            warn!(provider, error = %e, retry_in = ?wait, "Retrying price request");
        },
    )
    .await
}

/// Map a non-2xx response to a provider error.
pub fn check_status(provider: &'static str, response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
        })
    }
}

/// Parse a provider price, rejecting anything that is not strictly positive.
pub fn parse_price(provider: &'static str, raw: &str) -> Result<Money, ProviderError> {
    let invalid = || ProviderError::InvalidPrice {
        provider,
        value: raw.to_string(),
    };
    let price = Money::from_str(raw).map_err(|_| invalid())?;
    if price.is_positive() {
        Ok(price)
    } else {
        Err(invalid())
    }
}
