//! Data models for trades, quotes, and derived valuations.

mod quote;
mod symbol;
mod trade;
mod valuation;

pub use quote::{PriceQuote, QuoteSource};
pub use symbol::Symbol;
pub use trade::{AssetType, NewTrade, Trade, TradeType};
pub use valuation::{Holding, PortfolioSummary, ValuationResult};
