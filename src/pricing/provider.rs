//! Price provider capability.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::models::{PriceQuote, Symbol};

/// A single source of current prices.
///
/// Implementations are stateless with respect to the domain: each call
/// stands alone and may be retried or abandoned by the resolver.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Short identifier used in logs.
    fn id(&self) -> &'static str;

    /// Resolve the latest price for `symbol`.
    async fn latest_price(&self, symbol: &Symbol) -> Result<PriceQuote, ProviderError>;
}
