//! Instrument symbol.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValuationError;

/// Case-insensitive ticker or coin identifier, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(raw: &str) -> Result<Self, ValuationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValuationError::InvalidInput(
                "symbol must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    /// Form used for equity quote lookups.
    pub fn ticker(&self) -> &str {
        &self.0
    }

    /// Form used for crypto market-data lookups.
    pub fn coin_id(&self) -> String {
        self.0.to_lowercase()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValuationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Symbol::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}
