//! # Core Configuration Module
//!
//! Builder-based configuration for the drive core.
//!
//! ## Overview
//!
//! [`CoreConfig`] bundles the host bridges (HTTP transport, account store,
//! settings store) with the tunables of the listing pipeline. The builder
//! validates everything up front and fails fast with
//! [`Error::CapabilityMissing`] when a bridge is absent.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - provider traffic
//! - `AccountStore` - account persistence
//! - `SettingsStore` - settings items
//!
//! With the `desktop-shims` feature, missing bridges are filled in with
//! `ReqwestHttpClient` and SQLite stores living at `database_path`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .database_path("data/data.db")
//!     .cache_capacity(2048)
//!     .build()
//!     .await?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{AccountStore, HttpClient, RetryPolicy, SettingsStore};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Marker prefix of the file that carries a folder's access password.
pub const DEFAULT_PASSWORD_PREFIX: &str = ".password-";

pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

pub const DEFAULT_PAGE_SIZE: usize = 30;

/// Core configuration for the drive core.
#[derive(Clone)]
pub struct CoreConfig {
    /// SQLite file used by the desktop stores, if any
    pub database_path: Option<PathBuf>,

    pub http_client: Arc<dyn HttpClient>,

    pub account_store: Arc<dyn AccountStore>,

    pub settings_store: Arc<dyn SettingsStore>,

    /// Directory listings kept per driver before eviction
    pub cache_capacity: usize,

    /// Page size used when a caller asks for a page without a size
    pub default_page_size: usize,

    pub password_prefix: String,

    /// Transport retry policy for provider calls
    pub retry_policy: RetryPolicy,
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("cache_capacity", &self.cache_capacity)
            .field("default_page_size", &self.default_page_size)
            .field("password_prefix", &self.password_prefix)
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the tunables.
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(Error::Config(
                "Cache capacity must be greater than 0".to_string(),
            ));
        }

        if self.default_page_size == 0 {
            return Err(Error::Config(
                "Default page size must be greater than 0".to_string(),
            ));
        }

        if self.password_prefix.trim().is_empty() {
            return Err(Error::Config(
                "Password marker prefix cannot be empty".to_string(),
            ));
        }

        if self.retry_policy.max_retries > 10 {
            return Err(Error::Config(
                "Transport retries exceed the maximum of 10".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn capability_missing(capability: &str, hint: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: hint.to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    let client = bridge_desktop::ReqwestHttpClient::new()
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(capability_missing(
        "HttpClient",
        "An HttpClient implementation is required for provider traffic. \
         Enable the 'desktop-shims' feature for the reqwest client or inject one.",
    ))
}

#[cfg(feature = "desktop-shims")]
async fn provide_default_stores(
    database_path: Option<&PathBuf>,
) -> Result<(Arc<dyn AccountStore>, Arc<dyn SettingsStore>)> {
    use bridge_desktop::{open_pool, SqliteAccountStore, SqliteSettingsStore};

    let path = database_path.ok_or_else(|| {
        Error::Config(
            "Database path is required for the default SQLite stores. \
             Use .database_path() or inject the stores."
                .to_string(),
        )
    })?;

    let pool = open_pool(path)
        .await
        .map_err(|e| Error::Internal(format!("Failed to open database: {}", e)))?;
    let accounts = SqliteAccountStore::with_pool(pool.clone())
        .await
        .map_err(|e| Error::Internal(format!("Failed to initialize AccountStore: {}", e)))?;
    let settings = SqliteSettingsStore::with_pool(pool)
        .await
        .map_err(|e| Error::Internal(format!("Failed to initialize SettingsStore: {}", e)))?;

    Ok((Arc::new(accounts), Arc::new(settings)))
}

#[cfg(not(feature = "desktop-shims"))]
async fn provide_default_stores(
    _database_path: Option<&PathBuf>,
) -> Result<(Arc<dyn AccountStore>, Arc<dyn SettingsStore>)> {
    Err(capability_missing(
        "AccountStore/SettingsStore",
        "Persistence bridges are required for accounts and settings. \
         Enable the 'desktop-shims' feature for SQLite stores or inject both.",
    ))
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    account_store: Option<Arc<dyn AccountStore>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    cache_capacity: Option<usize>,
    default_page_size: Option<usize>,
    password_prefix: Option<String>,
    retry_policy: Option<RetryPolicy>,
}

impl CoreConfigBuilder {
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn account_store(mut self, store: Arc<dyn AccountStore>) -> Self {
        self.account_store = Some(store);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Default: 1024 listings
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Default: 30
    pub fn default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = Some(size);
        self
    }

    /// Default: `.password-`
    pub fn password_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.password_prefix = Some(prefix.into());
        self
    }

    /// Default: three extra attempts, one second apart
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Builds and validates the configuration, filling in desktop defaults
    /// for missing bridges when available.
    pub async fn build(self) -> Result<CoreConfig> {
        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let (account_store, settings_store) = match (self.account_store, self.settings_store) {
            (Some(accounts), Some(settings)) => (accounts, settings),
            (accounts, settings) => {
                let (default_accounts, default_settings) =
                    provide_default_stores(self.database_path.as_ref()).await?;
                (
                    accounts.unwrap_or(default_accounts),
                    settings.unwrap_or(default_settings),
                )
            }
        };

        let config = CoreConfig {
            database_path: self.database_path,
            http_client,
            account_store,
            settings_store,
            cache_capacity: self.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
            default_page_size: self.default_page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            password_prefix: self
                .password_prefix
                .unwrap_or_else(|| DEFAULT_PASSWORD_PREFIX.to_string()),
            retry_policy: self.retry_policy.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
