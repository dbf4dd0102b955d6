//! Persistence Abstractions
//!
//! The core only needs a small CRUD contract for account records and
//! settings items; the storage engine is supplied by the host.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// One configured, credentialed provider instance.
///
/// `name` is the unique key. Provider-specific fields are optional strings
/// so that a single record shape covers every driver.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub name: String,
    /// Position in the mount listing; lower first
    pub index: i32,
    /// Provider-type tag, the driver registry key
    pub provider: String,
    pub username: String,
    pub password: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Native id (or path, for path-addressed providers) of the mount root
    pub root_folder: String,
    /// Runtime status: `"work"` or the last failure reason
    pub status: String,
    pub order_by: String,
    pub order_direction: String,
    /// Folder placement in listings: `front`, `back`, or empty for provider order
    pub extract_folder: String,
    /// Page size requested from providers that accept one
    pub limit: u32,
    pub drive_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub zone: String,
    pub site_id: String,
    pub onedrive_type: String,
    /// Serve file bodies through the proxy instead of redirecting
    pub proxy: bool,
    /// External download proxy; file requests are redirected to
    /// `<first line><path>` when set
    pub down_proxy_url: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(value: &str) -> &'static str {
            if value.is_empty() {
                ""
            } else {
                "[REDACTED]"
            }
        }

        f.debug_struct("Account")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("provider", &self.provider)
            .field("username", &self.username)
            .field("password", &mask(&self.password))
            .field("access_token", &mask(&self.access_token))
            .field("refresh_token", &mask(&self.refresh_token))
            .field("root_folder", &self.root_folder)
            .field("status", &self.status)
            .field("order_by", &self.order_by)
            .field("order_direction", &self.order_direction)
            .field("extract_folder", &self.extract_folder)
            .field("limit", &self.limit)
            .field("drive_id", &self.drive_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &mask(&self.client_secret))
            .field("zone", &self.zone)
            .field("site_id", &self.site_id)
            .field("onedrive_type", &self.onedrive_type)
            .field("proxy", &self.proxy)
            .field("down_proxy_url", &self.down_proxy_url)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}

/// Durable account records keyed by unique name.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::{Account, AccountStore};
///
/// async fn rename(store: &dyn AccountStore, old: &str, mut account: Account) -> Result<()> {
///     store.delete(old).await?;
///     store.save(&account).await
/// }
/// ```
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert or replace the record with `account.name`
    async fn save(&self, account: &Account) -> Result<()>;

    async fn get(&self, name: &str) -> Result<Option<Account>>;

    /// All records ordered by `index`, then `name`
    async fn list(&self) -> Result<Vec<Account>>;

    /// Remove a record; missing names are not an error
    async fn delete(&self, name: &str) -> Result<()>;
}

/// Who may read a setting item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingVisibility {
    Public,
    Private,
}

impl SettingVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingVisibility::Public => "public",
            SettingVisibility::Private => "private",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "public" => Some(SettingVisibility::Public),
            "private" => Some(SettingVisibility::Private),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingItem {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub description: String,
    pub visibility: SettingVisibility,
}

impl SettingItem {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        visibility: SettingVisibility,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            description: String::new(),
            visibility,
        }
    }
}

/// Settings-item persistence
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Upsert every item by key
    async fn save_items(&self, items: &[SettingItem]) -> Result<()>;

    async fn get_item(&self, key: &str) -> Result<Option<SettingItem>>;

    /// Items ordered by key, optionally restricted to one visibility class
    async fn list_items(&self, visibility: Option<SettingVisibility>) -> Result<Vec<SettingItem>>;

    async fn delete_item(&self, key: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_debug_redacts_secrets() {
        let mut account = Account::new("home", "AliDrive");
        account.refresh_token = "very-secret-refresh".to_string();
        account.password = "hunter2".to_string();

        let rendered = format!("{:?}", account);
        assert!(rendered.contains("home"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("very-secret-refresh"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_account_deserializes_with_missing_fields() {
        let account: Account =
            serde_json::from_str(r#"{"name":"pan","provider":"123Pan","proxy":true}"#).unwrap();

        assert_eq!(account.name, "pan");
        assert!(account.proxy);
        assert!(account.root_folder.is_empty());
        assert_eq!(account.updated_at, None);
    }

    #[test]
    fn test_visibility_round_trip_names() {
        assert_eq!(
            SettingVisibility::parse(SettingVisibility::Private.as_str()),
            Some(SettingVisibility::Private)
        );
        assert_eq!(SettingVisibility::parse("admin"), None);
    }
}
