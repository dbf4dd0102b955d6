//! Account Storage using SQLite
//!
//! Each account is one row; the full record is kept as JSON next to the
//! columns used for ordering so new provider fields need no migration.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{Account, AccountStore},
};
use sqlx::{sqlite::SqlitePool, Row};
use std::path::Path;
use tracing::debug;

use crate::db;

pub struct SqliteAccountStore {
    pool: SqlitePool,
}

impl SqliteAccountStore {
    pub async fn new(db_path: &Path) -> Result<Self> {
        let pool = db::open_pool(db_path).await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                name TEXT PRIMARY KEY,
                idx INTEGER NOT NULL DEFAULT 0,
                provider TEXT NOT NULL,
                record TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to create table: {}", e)))?;

        debug!("Initialized account store");
        Ok(Self { pool })
    }

    pub async fn in_memory() -> Result<Self> {
        Self::with_pool(db::memory_pool().await?).await
    }

    fn decode(record: &str) -> Result<Account> {
        serde_json::from_str(record)
            .map_err(|e| BridgeError::DatabaseError(format!("Corrupt account record: {}", e)))
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn save(&self, account: &Account) -> Result<()> {
        let record = serde_json::to_string(account)
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to encode account: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO accounts (name, idx, provider, record)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                idx = excluded.idx,
                provider = excluded.provider,
                record = excluded.record
            "#,
        )
        .bind(&account.name)
        .bind(account.index)
        .bind(&account.provider)
        .bind(record)
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to save account: {}", e)))?;

        debug!(account = %account.name, "Stored account");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Account>> {
        let row = sqlx::query("SELECT record FROM accounts WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to get account: {}", e)))?;

        row.map(|row| Self::decode(row.get::<String, _>("record").as_str()))
            .transpose()
    }

    async fn list(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query("SELECT record FROM accounts ORDER BY idx, name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to list accounts: {}", e)))?;

        rows.iter()
            .map(|row| Self::decode(row.get::<String, _>("record").as_str()))
            .collect()
    }

    async fn delete(&self, name: &str) -> Result<()> {
        sqlx::query("DELETE FROM accounts WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to delete account: {}", e)))?;

        debug!(account = name, "Deleted account");
        Ok(())
    }
}
