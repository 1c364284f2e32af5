//! Owner-scoped trade storage on SQLite.
//!
//! Decimal columns are stored as TEXT so amounts come back exactly as
//! written. Trade dates are fixed-width RFC 3339 strings, which keeps
//! lexical and chronological order the same.

use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqlitePoolOptions, QueryBuilder, Sqlite, SqlitePool};

use crate::error::ValuationError;
use crate::models::{AssetType, NewTrade, Symbol, Trade, TradeType};
use crate::money::Money;

const TRADE_COLUMNS: &str = "id, owner_id, symbol, asset_type, trade_type, quantity, \
     price_per_unit, total_amount, fees, notes, trade_date";

/// Optional narrowing of a trade listing.
#[derive(Debug, Clone, Default)]
pub struct TradeFilter {
    pub symbol: Option<Symbol>,
    pub asset_type: Option<AssetType>,
    /// Inclusive lower bound on trade date
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on trade date
    pub to: Option<DateTime<Utc>>,
}

impl TradeFilter {
    pub fn matches(&self, trade: &Trade) -> bool {
        self.symbol.as_ref().map_or(true, |s| *s == trade.symbol)
            && self.asset_type.as_ref().map_or(true, |a| *a == trade.asset_type)
            && self.from.map_or(true, |from| trade.trade_date >= from)
            && self.to.map_or(true, |to| trade.trade_date <= to)
    }
}

/// Storage operations the valuation core reads trades through.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Owner's trades matching `filter`, newest first.
    async fn list_trades_filtered(
        &self,
        owner_id: i64,
        filter: &TradeFilter,
    ) -> Result<Vec<Trade>, ValuationError>;

    async fn list_trades(&self, owner_id: i64) -> Result<Vec<Trade>, ValuationError> {
        self.list_trades_filtered(owner_id, &TradeFilter::default())
            .await
    }

    /// A trade owned by someone else is reported as not found.
    async fn get_trade(&self, owner_id: i64, id: i64) -> Result<Trade, ValuationError>;

    async fn insert_trade(&self, owner_id: i64, trade: &NewTrade) -> Result<Trade, ValuationError>;

    async fn delete_trade(&self, owner_id: i64, id: i64) -> Result<(), ValuationError>;
}

/// Database connection pool.
pub struct Database {
    pool: SqlitePool,
}

/// Raw trade row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredTrade {
    pub id: i64,
    pub owner_id: i64,
    pub symbol: String,
    pub asset_type: String,
    pub trade_type: String,
    pub quantity: String,
    pub price_per_unit: String,
    pub total_amount: String,
    pub fees: String,
    pub notes: Option<String>,
    pub trade_date: String,
}

impl TryFrom<StoredTrade> for Trade {
    type Error = ValuationError;

    fn try_from(row: StoredTrade) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |reason: String| ValuationError::CorruptRecord { id, reason };
        let money = |column: &str, raw: &str| {
            Money::from_str(raw).map_err(|e| corrupt(format!("{column}: {e}")))
        };

        Ok(Trade {
            id,
            owner_id: row.owner_id,
            symbol: Symbol::parse(&row.symbol).map_err(|e| corrupt(e.to_string()))?,
            asset_type: AssetType::from_str(&row.asset_type).map_err(|e| corrupt(e.to_string()))?,
            trade_type: TradeType::from_str(&row.trade_type).map_err(|e| corrupt(e.to_string()))?,
            quantity: money("quantity", &row.quantity)?,
            price_per_unit: money("price_per_unit", &row.price_per_unit)?,
            total_amount: money("total_amount", &row.total_amount)?,
            fees: money("fees", &row.fees)?,
            notes: row.notes,
            trade_date: DateTime::parse_from_rfc3339(&row.trade_date)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| corrupt(format!("trade_date: {e}")))?,
        })
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Database {
    /// Create a new database connection.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Every connection to an in-memory database gets its own copy.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL,
                symbol TEXT NOT NULL,
                asset_type TEXT NOT NULL,
                trade_type TEXT NOT NULL CHECK (trade_type IN ('BUY', 'SELL')),
                quantity TEXT NOT NULL,
                price_per_unit TEXT NOT NULL,
                total_amount TEXT NOT NULL,
                fees TEXT NOT NULL DEFAULT '0.00',
                notes TEXT,
                trade_date TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create trades table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_owner_date ON trades(owner_id, trade_date)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_owner_symbol ON trades(owner_id, symbol)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl TradeStore for Database {
    async fn list_trades_filtered(
        &self,
        owner_id: i64,
        filter: &TradeFilter,
    ) -> Result<Vec<Trade>, ValuationError> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {TRADE_COLUMNS} FROM trades WHERE owner_id = "
        ));
        query.push_bind(owner_id);

        if let Some(symbol) = &filter.symbol {
            query.push(" AND symbol = ").push_bind(symbol.as_str().to_string());
        }
        if let Some(asset_type) = &filter.asset_type {
            query
                .push(" AND asset_type = ")
                .push_bind(asset_type.as_str().to_string());
        }
        if let Some(from) = filter.from {
            query.push(" AND trade_date >= ").push_bind(format_date(from));
        }
        if let Some(to) = filter.to {
            query.push(" AND trade_date <= ").push_bind(format_date(to));
        }
        query.push(" ORDER BY trade_date DESC, id DESC");

        let rows = query
            .build_query_as::<StoredTrade>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Trade::try_from).collect()
    }

    async fn get_trade(&self, owner_id: i64, id: i64) -> Result<Trade, ValuationError> {
        let sql = format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = ? AND owner_id = ?");
        let row: Option<StoredTrade> = sqlx::query_as(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or(ValuationError::NotFound { id })?.try_into()
    }

    async fn insert_trade(&self, owner_id: i64, trade: &NewTrade) -> Result<Trade, ValuationError> {
        let trade = trade.validate()?;

        let result = sqlx::query(
            r#"
            INSERT INTO trades (
                owner_id, symbol, asset_type, trade_type, quantity,
                price_per_unit, total_amount, fees, notes, trade_date
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(owner_id)
        .bind(trade.symbol.as_str())
        .bind(trade.asset_type.as_str())
        .bind(trade.trade_type.as_str())
        .bind(trade.quantity.to_string())
        .bind(trade.price_per_unit.to_string())
        .bind(trade.total_amount.to_string())
        .bind(trade.fees.to_string())
        .bind(trade.notes.as_deref())
        .bind(format_date(trade.trade_date))
        .execute(&self.pool)
        .await?;

        self.get_trade(owner_id, result.last_insert_rowid()).await
    }

    async fn delete_trade(&self, owner_id: i64, id: i64) -> Result<(), ValuationError> {
        let result = sqlx::query("DELETE FROM trades WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ValuationError::NotFound { id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    async fn memory_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    fn new_trade(symbol: &str, side: TradeType, qty: &str, price: &str) -> NewTrade {
        NewTrade {
            symbol: symbol.to_string(),
            asset_type: "stock".to_string(),
            trade_type: side,
            quantity: qty.parse().unwrap(),
            price_per_unit: price.parse().unwrap(),
            fees: None,
            notes: None,
            trade_date: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = memory_db().await;
        let mut input = new_trade("aapl", TradeType::Buy, "0.12345678", "189.99");
        input.fees = Some("1.5".parse().unwrap());
        input.notes = Some("first lot".to_string());

        let saved = db.insert_trade(7, &input).await.unwrap();
        let loaded = db.get_trade(7, saved.id).await.unwrap();

        assert_eq!(loaded, saved);
        assert_eq!(loaded.symbol.as_str(), "AAPL");
        assert_eq!(loaded.quantity.to_string(), "0.12345678");
        assert_eq!(loaded.price_per_unit, Money::from(dec!(189.99)));
        assert_eq!(loaded.total_amount.to_string(), "23.46");
        assert_eq!(loaded.fees.to_string(), "1.50");
        assert_eq!(loaded.notes.as_deref(), Some("first lot"));
    }

    #[tokio::test]
    async fn test_owner_scoping() {
        let db = memory_db().await;
        let saved = db
            .insert_trade(1, &new_trade("MSFT", TradeType::Buy, "1", "300"))
            .await
            .unwrap();

        assert!(matches!(
            db.get_trade(2, saved.id).await,
            Err(ValuationError::NotFound { .. })
        ));
        assert!(db.list_trades(2).await.unwrap().is_empty());
        assert!(matches!(
            db.delete_trade(2, saved.id).await,
            Err(ValuationError::NotFound { .. })
        ));

        tokio_test::assert_ok!(db.delete_trade(1, saved.id).await);
        tokio_test::assert_err!(db.get_trade(1, saved.id).await);
    }

    #[tokio::test]
    async fn test_invalid_trade_not_stored() {
        let db = memory_db().await;
        let result = db
            .insert_trade(1, &new_trade("MSFT", TradeType::Buy, "-1", "300"))
            .await;

        assert!(matches!(result, Err(ValuationError::InvalidInput(_))));
        assert!(db.list_trades(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_order_and_filters() {
        let db = memory_db().await;
        let day = |d: u32| Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap();

        for (symbol, asset, d) in [("AAPL", "stock", 1), ("BTC", "crypto", 5), ("AAPL", "stock", 9)] {
            let mut trade = new_trade(symbol, TradeType::Buy, "1", "10");
            trade.asset_type = asset.to_string();
            trade.trade_date = Some(day(d));
            db.insert_trade(1, &trade).await.unwrap();
        }

        let all = db.list_trades(1).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].trade_date, day(9));
        assert_eq!(all[2].trade_date, day(1));

        let filter = TradeFilter {
            symbol: Some(Symbol::parse("aapl").unwrap()),
            ..TradeFilter::default()
        };
        assert_eq!(db.list_trades_filtered(1, &filter).await.unwrap().len(), 2);

        let filter = TradeFilter {
            asset_type: Some(AssetType::Crypto),
            ..TradeFilter::default()
        };
        let crypto = db.list_trades_filtered(1, &filter).await.unwrap();
        assert_eq!(crypto.len(), 1);
        assert_eq!(crypto[0].symbol.as_str(), "BTC");

        let filter = TradeFilter {
            from: Some(day(2)),
            to: Some(day(9)),
            ..TradeFilter::default()
        };
        let ranged = db.list_trades_filtered(1, &filter).await.unwrap();
        assert_eq!(ranged.len(), 2);
        assert!(ranged.iter().all(|t| filter.matches(t)));
    }
}
