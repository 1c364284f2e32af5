//! Trade valuation and portfolio aggregation.

mod engine;
mod portfolio;

pub use engine::{unpriced, valuate};
pub use portfolio::{aggregate, holdings};

#[cfg(test)]
pub(crate) use engine::tests::make_trade;
