//! Settings Storage using SQLite

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{SettingItem, SettingVisibility, SettingsStore},
};
use chrono::Utc;
use sqlx::{sqlite::SqlitePool, Row};
use std::path::Path;
use tracing::{debug, error};

use crate::db;

/// SQLite-backed settings store implementation
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    /// Create a new settings store with the given database path
    pub async fn new(db_path: &Path) -> Result<Self> {
        let pool = db::open_pool(db_path).await?;
        Self::with_pool(pool).await
    }

    /// Use an existing pool, creating the table if necessary
    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS setting_items (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                visibility TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to create table: {}", e)))?;

        debug!("Initialized settings store");
        Ok(Self { pool })
    }

    /// Create an in-memory settings store (for testing)
    pub async fn in_memory() -> Result<Self> {
        Self::with_pool(db::memory_pool().await?).await
    }

    fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<SettingItem> {
        let key: String = row.get("key");
        let visibility: String = row.get("visibility");
        let visibility = SettingVisibility::parse(&visibility).ok_or_else(|| {
            error!(key = %key, visibility = %visibility, "Unknown setting visibility");
            BridgeError::DatabaseError(format!("Unknown visibility '{}' for {}", visibility, key))
        })?;

        Ok(SettingItem {
            key,
            value: row.get("value"),
            description: row.get("description"),
            visibility,
        })
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn save_items(&self, items: &[SettingItem]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to begin: {}", e)))?;

        let now = Utc::now().timestamp();
        for item in items {
            sqlx::query(
                r#"
                INSERT INTO setting_items (key, value, description, visibility, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    description = excluded.description,
                    visibility = excluded.visibility,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&item.key)
            .bind(&item.value)
            .bind(&item.description)
            .bind(item.visibility.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to save setting: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to commit: {}", e)))?;

        debug!(count = items.len(), "Stored settings");
        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<Option<SettingItem>> {
        let row = sqlx::query(
            "SELECT key, value, description, visibility FROM setting_items WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to get setting: {}", e)))?;

        row.as_ref().map(Self::row_to_item).transpose()
    }

    async fn list_items(&self, visibility: Option<SettingVisibility>) -> Result<Vec<SettingItem>> {
        let rows = match visibility {
            Some(visibility) => {
                sqlx::query(
                    "SELECT key, value, description, visibility FROM setting_items \
                     WHERE visibility = ? ORDER BY key",
                )
                .bind(visibility.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT key, value, description, visibility FROM setting_items ORDER BY key",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| BridgeError::DatabaseError(format!("Failed to list settings: {}", e)))?;

        rows.iter().map(Self::row_to_item).collect()
    }

    async fn delete_item(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM setting_items WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to delete setting: {}", e)))?;

        debug!(key = key, "Deleted setting");
        Ok(())
    }
}
