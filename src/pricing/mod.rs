//! Price resolution: provider capability, static fallback table, ordered resolver.

mod fallback;
mod provider;
mod resolver;

pub use fallback::StaticPriceProvider;
pub use provider::PriceProvider;
pub use resolver::PriceResolver;

#[cfg(test)]
pub(crate) use resolver::tests::MockProvider;
