//! # Drive Service
//!
//! The facade host layers talk to. It owns the account registry, the auth
//! manager and one driver per provider type, and maps absolute paths onto
//! accounts through the [mount table](crate::mount).
//!
//! ## Listing pipeline
//!
//! `driver.files` → password marker removed → local sort (drivers with
//! `local_sort`) → folder placement from the account's `extract_folder`
//! (provider order when empty) → page slice.

use bridge_traits::{Account, SettingItem, SettingVisibility};
use chrono::Utc;
use core_auth::{AccountRegistry, AuthError, AuthManager, Authenticator};
use core_drive::{
    common_items, extract_folders, paginate, password_gate, path, sort_files, DriveError, Driver,
    DriverAuthenticator, DriverConfig, DriverDeps, DriverRegistry, File, FolderPlacement,
    FormItem, ProxyHeaders, SortOrder,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{AccountEvent, CacheEvent, CoreEvent, EventBus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, ServiceError};
use crate::mount::{self, Mount, VIRTUAL_DRIVER};
use crate::settings::{self, KEY_README_FILE};

/// Page request; `0/0` returns the whole listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    pub page_num: usize,
    /// 0 with a page number uses the configured default size
    pub page_size: usize,
}

impl ListOptions {
    pub fn page(page_num: usize, page_size: usize) -> Self {
        Self {
            page_num,
            page_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub files: Vec<File>,
    /// Entries before the page slice
    pub total: usize,
    /// Password carried by the folder's marker file
    pub password: Option<String>,
    /// The folder's readme, when it has one
    pub readme: Option<File>,
}

/// Admin form of one provider type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverSchema {
    pub config: DriverConfig,
    pub items: Vec<FormItem>,
}

pub struct DriveService {
    config: CoreConfig,
    accounts: AccountRegistry,
    auth: Arc<AuthManager>,
    drivers: HashMap<&'static str, Arc<dyn Driver>>,
    events: EventBus,
}

impl DriveService {
    pub async fn new(config: CoreConfig, registry: DriverRegistry) -> Result<Self> {
        Self::with_event_bus(config, registry, EventBus::default()).await
    }

    /// Loads every stored account and instantiates each registered driver
    /// once. No provider is contacted; see [`DriveService::refresh_all`].
    pub async fn with_event_bus(
        config: CoreConfig,
        registry: DriverRegistry,
        events: EventBus,
    ) -> Result<Self> {
        config.validate()?;

        let accounts = AccountRegistry::new();
        let loaded = accounts.load_from(config.account_store.as_ref()).await?;
        let auth = Arc::new(AuthManager::new(
            accounts.clone(),
            config.account_store.clone(),
            events.clone(),
        ));

        let deps = DriverDeps::new(config.http_client.clone(), auth.clone(), config.cache_capacity)
            .with_retry(config.retry_policy.clone());
        let mut drivers = HashMap::new();
        for name in registry.names() {
            drivers.insert(name, registry.create(name, deps.clone())?);
        }

        info!(accounts = loaded, drivers = drivers.len(), "Drive service ready");
        Ok(Self {
            config,
            accounts,
            auth,
            drivers,
            events,
        })
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn driver_for(&self, provider: &str) -> Result<Arc<dyn Driver>> {
        self.drivers
            .get(provider)
            .cloned()
            .ok_or_else(|| DriveError::UnknownDriver(provider.to_string()).into())
    }

    async fn account_snapshot(&self, name: &str) -> Result<Account> {
        self.accounts.get(name).await.map_err(|err| match err {
            AuthError::AccountNotFound(name) => ServiceError::AccountNotFound(name),
            other => other.into(),
        })
    }

    async fn mount(&self, path: &str) -> Result<Mount> {
        let accounts = self.accounts.list().await;
        if accounts.is_empty() {
            return Err(ServiceError::NoAccounts);
        }
        mount::resolve(&accounts, path)
            .ok_or_else(|| DriveError::PathNotFound(path::normalize(path)).into())
    }

    fn page(&self, files: Vec<File>, options: ListOptions) -> Result<Vec<File>> {
        let page_size = if options.page_num > 0 && options.page_size == 0 {
            self.config.default_page_size
        } else {
            options.page_size
        };
        Ok(paginate(files, options.page_num, page_size)?)
    }

    async fn readme(&self, files: &[File]) -> Result<Option<File>> {
        let name = match self.config.settings_store.get_item(KEY_README_FILE).await? {
            Some(item) if !item.value.is_empty() => item.value,
            _ => return Ok(None),
        };
        Ok(files
            .iter()
            .find(|f| !f.is_folder() && f.name.eq_ignore_ascii_case(&name))
            .cloned())
    }

    // ------------------------------------------------------------------
    // Public operations
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list(&self, path: &str, options: ListOptions) -> Result<Listing> {
        let (name, inner) = match self.mount(path).await? {
            Mount::Virtual(files) => {
                let total = files.len();
                return Ok(Listing {
                    files: self.page(files, options)?,
                    total,
                    password: None,
                    readme: None,
                });
            }
            Mount::Account { name, path } => (name, path),
        };

        let account = self.account_snapshot(&name).await?;
        let driver = self.driver_for(&account.provider)?;

        let files = driver.files(&name, &inner).await?;
        let (mut files, password) = password_gate(files, &self.config.password_prefix);
        if driver.config().local_sort {
            sort_files(
                &mut files,
                SortOrder::parse(&account.order_by, &account.order_direction),
            );
        }
        let files = match FolderPlacement::parse(&account.extract_folder) {
            Some(placement) => extract_folders(files, placement),
            None => files,
        };
        let readme = self.readme(&files).await?;
        let total = files.len();
        debug!(account = %name, total, "Listed folder");

        Ok(Listing {
            files: self.page(files, options)?,
            total,
            password,
            readme,
        })
    }

    #[instrument(skip(self))]
    pub async fn stat(&self, path: &str) -> Result<File> {
        match self.mount(path).await? {
            Mount::Virtual(_) => {
                let (_, name) = path::split(path);
                let name = if name.is_empty() { "/".to_string() } else { name };
                Ok(File::folder(name, VIRTUAL_DRIVER))
            }
            Mount::Account { name, path } => {
                let account = self.account_snapshot(&name).await?;
                Ok(self.driver_for(&account.provider)?.file(&name, &path).await?)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn link(&self, path: &str) -> Result<String> {
        match self.mount(path).await? {
            Mount::Virtual(_) => Err(DriveError::NotAFile(path::normalize(path)).into()),
            Mount::Account { name, path } => {
                let account = self.account_snapshot(&name).await?;
                Ok(self.driver_for(&account.provider)?.link(&name, &path).await?)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn preview(&self, path: &str) -> Result<serde_json::Value> {
        match self.mount(path).await? {
            Mount::Virtual(_) => Err(DriveError::NotAFile(path::normalize(path)).into()),
            Mount::Account { name, path } => {
                let account = self.account_snapshot(&name).await?;
                Ok(self.driver_for(&account.provider)?.preview(&name, &path).await?)
            }
        }
    }

    /// Header edits for streaming files of `account` through a proxy.
    pub async fn proxy_headers(&self, account: &str) -> Result<ProxyHeaders> {
        let account = self.account_snapshot(account).await?;
        Ok(self.driver_for(&account.provider)?.proxy_headers(&account))
    }

    /// External download proxy URL for the file at `path`, when its account
    /// has one configured. Only the first line of `down_proxy_url` is used.
    pub async fn down_proxy_link(&self, path: &str) -> Result<Option<String>> {
        match self.mount(path).await? {
            Mount::Virtual(_) => Err(DriveError::NotAFile(path::normalize(path)).into()),
            Mount::Account { name, .. } => {
                let account = self.account_snapshot(&name).await?;
                let base = account
                    .down_proxy_url
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .trim_end_matches('/');
                if base.is_empty() {
                    return Ok(None);
                }
                Ok(Some(format!("{}{}", base, path::normalize(path))))
            }
        }
    }

    /// Whether files of `account` must be streamed instead of linked.
    pub async fn requires_proxy(&self, account: &str) -> Result<bool> {
        let account = self.account_snapshot(account).await?;
        Ok(account.proxy || self.driver_for(&account.provider)?.config().only_proxy)
    }

    /// Drops cached listings at `path` and below.
    pub async fn invalidate(&self, path: &str) -> Result<usize> {
        match self.mount(path).await? {
            Mount::Virtual(_) => Ok(0),
            Mount::Account { name, path } => {
                let account = self.account_snapshot(&name).await?;
                let dropped = self.driver_for(&account.provider)?.invalidate(&name, &path);
                self.events.emit(CoreEvent::Cache(CacheEvent::Invalidated {
                    account: name,
                    path: Some(path),
                }));
                Ok(dropped)
            }
        }
    }

    // ------------------------------------------------------------------
    // Admin operations
    // ------------------------------------------------------------------

    /// Admin forms of every provider type, ordered by name.
    pub fn driver_schemas(&self) -> Vec<DriverSchema> {
        let mut schemas: Vec<DriverSchema> = self
            .drivers
            .values()
            .map(|driver| {
                let mut items = driver.items();
                items.extend(common_items());
                DriverSchema {
                    config: driver.config(),
                    items,
                }
            })
            .collect();
        schemas.sort_by(|a, b| a.config.name.cmp(b.config.name));
        schemas
    }

    /// Accounts ordered by index, then name.
    pub async fn accounts(&self) -> Vec<Account> {
        self.accounts.list().await
    }

    pub async fn account(&self, name: &str) -> Result<Account> {
        self.account_snapshot(name).await
    }

    /// Logs in; a rejected login is recorded in the account status rather
    /// than returned as an error.
    async fn bootstrap(&self, name: &str, driver: Arc<dyn Driver>) -> Result<Account> {
        match self.auth.login(name, &DriverAuthenticator(driver)).await {
            Ok(account) => Ok(account),
            Err(err @ AuthError::Persistence(_)) => Err(err.into()),
            Err(err) => {
                warn!(account = %name, error = %err, "Account bootstrap failed");
                self.account_snapshot(name).await
            }
        }
    }

    /// Claims `account.name` in the registry before anything is persisted,
    /// so concurrent creates or renames onto one name cannot both succeed.
    async fn reserve(&self, account: &Account) -> Result<()> {
        self.accounts
            .insert_new(account.clone())
            .await
            .map_err(|err| match err {
                AuthError::AccountExists(name) => ServiceError::AccountExists(name),
                other => other.into(),
            })
    }

    #[instrument(skip(self, account), fields(account = %account.name, provider = %account.provider))]
    pub async fn create_account(&self, mut account: Account) -> Result<Account> {
        if account.name.trim().is_empty() {
            return Err(ServiceError::InvalidRequest(
                "account name is required".to_string(),
            ));
        }
        let driver = self.driver_for(&account.provider)?;
        driver.prepare(&mut account)?;
        account.updated_at = Some(Utc::now());

        self.reserve(&account).await?;
        if let Err(err) = self.config.account_store.save(&account).await {
            self.accounts.remove(&account.name).await;
            return Err(err.into());
        }
        self.events.emit(CoreEvent::Account(AccountEvent::Created {
            account: account.name.clone(),
            provider: account.provider.clone(),
        }));

        self.bootstrap(&account.name, driver).await
    }

    /// Replaces the account stored as `name`; `account.name` may differ to
    /// rename it. Cached listings and sessions of the old record are dropped.
    #[instrument(skip(self, account), fields(new_name = %account.name))]
    pub async fn update_account(&self, name: &str, mut account: Account) -> Result<Account> {
        let old = self.account_snapshot(name).await?;
        let driver = self.driver_for(&account.provider)?;
        let renamed = old.name != account.name;

        driver.prepare(&mut account)?;
        account.updated_at = Some(Utc::now());
        if renamed {
            self.reserve(&account).await?;
            if let Err(err) = self.config.account_store.save(&account).await {
                self.accounts.remove(&account.name).await;
                return Err(err.into());
            }
            self.config.account_store.delete(&old.name).await?;
            self.accounts.remove(&old.name).await;
        } else {
            self.config.account_store.save(&account).await?;
            self.accounts.insert(account.clone()).await;
        }

        if let Ok(old_driver) = self.driver_for(&old.provider) {
            old_driver.forget_account(&old.name);
        }
        self.events.emit(CoreEvent::Cache(CacheEvent::Invalidated {
            account: old.name.clone(),
            path: None,
        }));
        if renamed {
            self.events.emit(CoreEvent::Account(AccountEvent::Deleted {
                account: old.name.clone(),
            }));
        }
        self.events.emit(CoreEvent::Account(AccountEvent::Updated {
            account: account.name.clone(),
        }));

        self.bootstrap(&account.name, driver).await
    }

    #[instrument(skip(self))]
    pub async fn delete_account(&self, name: &str) -> Result<()> {
        let account = self.account_snapshot(name).await?;
        self.config.account_store.delete(name).await?;
        self.accounts.remove(name).await;

        if let Ok(driver) = self.driver_for(&account.provider) {
            driver.forget_account(name);
        }
        self.events.emit(CoreEvent::Account(AccountEvent::Deleted {
            account: name.to_string(),
        }));
        info!(provider = %account.provider, "Account deleted");
        Ok(())
    }

    /// Logs one account in again.
    pub async fn login(&self, name: &str) -> Result<Account> {
        let account = self.account_snapshot(name).await?;
        let driver = self.driver_for(&account.provider)?;
        Ok(self.auth.login(name, &DriverAuthenticator(driver)).await?)
    }

    /// Logs every account in again; one outcome per account.
    pub async fn refresh_all(&self) -> Vec<(String, core_auth::Result<Account>)> {
        self.auth
            .refresh_all(|account| {
                self.drivers.get(account.provider.as_str()).map(|driver| {
                    Arc::new(DriverAuthenticator(driver.clone())) as Arc<dyn Authenticator>
                })
            })
            .await
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    pub async fn settings(&self, visibility: Option<SettingVisibility>) -> Result<Vec<SettingItem>> {
        Ok(self.config.settings_store.list_items(visibility).await?)
    }

    pub async fn setting(&self, key: &str) -> Result<Option<SettingItem>> {
        Ok(self.config.settings_store.get_item(key).await?)
    }

    pub async fn save_settings(&self, items: &[SettingItem]) -> Result<()> {
        if items.iter().any(|item| item.key.trim().is_empty()) {
            return Err(ServiceError::InvalidRequest(
                "setting key is required".to_string(),
            ));
        }
        Ok(self.config.settings_store.save_items(items).await?)
    }

    pub async fn delete_setting(&self, key: &str) -> Result<()> {
        Ok(self.config.settings_store.delete_item(key).await?)
    }

    /// Writes the default items whose keys are missing; existing values are
    /// kept. Returns how many were written.
    pub async fn seed_settings(&self) -> Result<usize> {
        let mut missing = Vec::new();
        for item in settings::defaults() {
            if self.config.settings_store.get_item(&item.key).await?.is_none() {
                missing.push(item);
            }
        }
        if !missing.is_empty() {
            self.config.settings_store.save_items(&missing).await?;
            info!(count = missing.len(), "Seeded default settings");
        }
        Ok(missing.len())
    }
}

impl std::fmt::Debug for DriveService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut drivers: Vec<_> = self.drivers.keys().collect();
        drivers.sort_unstable();
        f.debug_struct("DriveService")
            .field("config", &self.config)
            .field("drivers", &drivers)
            .finish_non_exhaustive()
    }
}
