//! Trade records as held by the storage layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::money::Money;

use super::Symbol;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Buy => "BUY",
            TradeType::Sell => "SELL",
        }
    }
}

impl FromStr for TradeType {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(TradeType::Buy),
            "SELL" => Ok(TradeType::Sell),
            other => Err(ValuationError::InvalidInput(format!(
                "unknown trade type {other:?}"
            ))),
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Asset class recorded with the trade.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetType {
    Stock,
    Crypto,
    Forex,
    #[serde(untagged)]
    Other(String),
}

impl AssetType {
    pub fn as_str(&self) -> &str {
        match self {
            AssetType::Stock => "STOCK",
            AssetType::Crypto => "CRYPTO",
            AssetType::Forex => "FOREX",
            AssetType::Other(s) => s,
        }
    }
}

impl FromStr for AssetType {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Ok(match upper.as_str() {
            "" => {
                return Err(ValuationError::InvalidInput(
                    "asset type must not be empty".to_string(),
                ))
            }
            "STOCK" => AssetType::Stock,
            "CRYPTO" => AssetType::Crypto,
            "FOREX" => AssetType::Forex,
            _ => AssetType::Other(upper),
        })
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A recorded trade owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,

    /// Owning user
    pub owner_id: i64,

    pub symbol: Symbol,

    pub asset_type: AssetType,

    pub trade_type: TradeType,

    /// Units traded, up to 8 decimal places
    pub quantity: Money,

    /// Entry price per unit, 2 decimal places
    pub price_per_unit: Money,

    /// quantity x price_per_unit, rounded to 2 places when recorded
    pub total_amount: Money,

    #[serde(default)]
    pub fees: Money,

    #[serde(default)]
    pub notes: Option<String>,

    pub trade_date: DateTime<Utc>,
}

/// Input for recording a new trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrade {
    pub symbol: String,
    pub asset_type: String,
    pub trade_type: TradeType,
    pub quantity: Money,
    pub price_per_unit: Money,
    #[serde(default)]
    pub fees: Option<Money>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub trade_date: Option<DateTime<Utc>>,
}

/// A [`NewTrade`] that passed validation, with normalized scales.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTrade {
    pub symbol: Symbol,
    pub asset_type: AssetType,
    pub trade_type: TradeType,
    pub quantity: Money,
    pub price_per_unit: Money,
    pub total_amount: Money,
    pub fees: Money,
    pub notes: Option<String>,
    pub trade_date: DateTime<Utc>,
}

impl NewTrade {
    pub fn validate(&self) -> Result<ValidatedTrade, ValuationError> {
        let symbol = Symbol::parse(&self.symbol)?;
        let asset_type = AssetType::from_str(&self.asset_type)?;

        let quantity = self.quantity.rescale(Money::QUANTITY_SCALE);
        if !quantity.is_positive() {
            return Err(ValuationError::InvalidInput(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }

        let price_per_unit = self.price_per_unit.rescale(Money::CURRENCY_SCALE);
        if !price_per_unit.is_positive() {
            return Err(ValuationError::InvalidInput(format!(
                "price must be positive, got {}",
                self.price_per_unit
            )));
        }

        let fees = self
            .fees
            .unwrap_or(Money::ZERO)
            .rescale(Money::CURRENCY_SCALE);
        if fees.is_negative() {
            return Err(ValuationError::InvalidInput(format!(
                "fees must not be negative, got {fees}"
            )));
        }

        let total_amount = quantity
            .checked_mul(price_per_unit)
            .ok_or_else(|| ValuationError::InvalidInput("trade amount overflows".to_string()))?
            .round_currency();

        let notes = self
            .notes
            .as_ref()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(ValidatedTrade {
            symbol,
            asset_type,
            trade_type: self.trade_type,
            quantity,
            price_per_unit,
            total_amount,
            fees,
            notes,
            trade_date: self.trade_date.unwrap_or_else(Utc::now),
        })
    }
}
