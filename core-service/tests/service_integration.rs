//! Integration tests for the drive service facade

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::BridgeError;
use bridge_traits::{
    Account, AccountStore, HttpClient, HttpRequest, HttpResponse, SettingItem, SettingVisibility,
    SettingsStore,
};
use core_auth::{AuthError, Authenticator, Credentials};
use core_drive::{
    path, DriveError, Driver, DriverConfig, DriverDeps, DriverRegistry, File, FileCategory,
    FileType, FormItem, ProxyHeaders,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{AccountEvent, CacheEvent, CoreEvent};
use core_service::settings::{KEY_PASSWORD, KEY_README_FILE};
use core_service::{DriveService, ListOptions, ServiceError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Fakes
// ============================================================================

struct NullHttp;

#[async_trait]
impl HttpClient for NullHttp {
    async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
        unimplemented!("the fake driver never reaches the network")
    }
}

#[derive(Default, Clone)]
struct MemoryAccounts {
    records: Arc<Mutex<HashMap<String, Account>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryAccounts {
    fn fail_saves(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.records.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    fn record(&self, name: &str) -> Option<Account> {
        self.records.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl AccountStore for MemoryAccounts {
    async fn save(&self, account: &Account) -> BridgeResult<()> {
        // Writes yield like a real database round trip
        tokio::task::yield_now().await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(BridgeError::DatabaseError("disk full".to_string()));
        }
        self.records
            .lock()
            .unwrap()
            .insert(account.name.clone(), account.clone());
        Ok(())
    }
    async fn get(&self, name: &str) -> BridgeResult<Option<Account>> {
        Ok(self.record(name))
    }
    async fn list(&self) -> BridgeResult<Vec<Account>> {
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }
    async fn delete(&self, name: &str) -> BridgeResult<()> {
        self.records.lock().unwrap().remove(name);
        Ok(())
    }
}

#[derive(Default, Clone)]
struct MemorySettings {
    items: Arc<Mutex<HashMap<String, SettingItem>>>,
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn save_items(&self, items: &[SettingItem]) -> BridgeResult<()> {
        let mut stored = self.items.lock().unwrap();
        for item in items {
            stored.insert(item.key.clone(), item.clone());
        }
        Ok(())
    }
    async fn get_item(&self, key: &str) -> BridgeResult<Option<SettingItem>> {
        Ok(self.items.lock().unwrap().get(key).cloned())
    }
    async fn list_items(
        &self,
        visibility: Option<SettingVisibility>,
    ) -> BridgeResult<Vec<SettingItem>> {
        let mut items: Vec<_> = self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|item| visibility.map_or(true, |v| item.visibility == v))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(items)
    }
    async fn delete_item(&self, key: &str) -> BridgeResult<()> {
        self.items.lock().unwrap().remove(key);
        Ok(())
    }
}

fn entry(name: &str, size: u64) -> File {
    File {
        id: name.to_string(),
        name: name.to_string(),
        size,
        file_type: FileType::File,
        category: FileCategory::from_name(name),
        driver: "Fake".to_string(),
        updated_at: None,
        thumbnail: None,
        url: None,
    }
}

fn folder(name: &str) -> File {
    File::folder(name, "Fake")
}

/// Serves the same small tree for every account. Logins fail for accounts
/// whose password is `wrong`.
struct FakeDriver {
    deps: DriverDeps,
}

impl FakeDriver {
    fn factory(deps: DriverDeps) -> Arc<dyn Driver> {
        Arc::new(Self { deps })
    }

    fn tree(path: &str) -> Option<Vec<File>> {
        match path {
            "/" => Some(vec![
                entry("b.txt", 30),
                entry(".password-xhf", 0),
                folder("docs"),
                entry("a.txt", 10),
                entry("README.md", 5),
            ]),
            "/docs" => Some(vec![entry("c.txt", 1)]),
            _ => None,
        }
    }
}

#[async_trait]
impl Authenticator for FakeDriver {
    async fn authenticate(&self, account: &Account) -> core_auth::Result<Credentials> {
        if account.password == "wrong" {
            return Err(AuthError::login_failed("Fake", "wrong password"));
        }
        Ok(Credentials::new(format!("token-{}", account.name)))
    }
}

#[async_trait]
impl Driver for FakeDriver {
    fn config(&self) -> DriverConfig {
        DriverConfig {
            name: "Fake",
            only_proxy: false,
            local_sort: true,
        }
    }

    fn items(&self) -> Vec<FormItem> {
        vec![FormItem::string("password", "password").required()]
    }

    fn prepare(&self, account: &mut Account) -> core_drive::Result<()> {
        if account.limit > 100 {
            return Err(DriveError::InvalidAccount("limit too large".to_string()));
        }
        if account.root_folder.is_empty() {
            account.root_folder = "/".to_string();
        }
        Ok(())
    }

    async fn file(&self, account: &str, file_path: &str) -> core_drive::Result<File> {
        self.deps.accounts.get(account).await?;
        let file_path = path::normalize(file_path);
        if file_path == "/" {
            return Ok(folder(account));
        }
        let (parent, name) = path::split(&file_path);
        Self::tree(&parent)
            .and_then(|files| files.into_iter().find(|f| f.name == name))
            .ok_or(DriveError::PathNotFound(file_path))
    }

    async fn files(&self, account: &str, file_path: &str) -> core_drive::Result<Vec<File>> {
        self.deps.accounts.get(account).await?;
        let file_path = path::normalize(file_path);
        Self::tree(&file_path).ok_or(DriveError::PathNotFound(file_path))
    }

    async fn link(&self, account: &str, file_path: &str) -> core_drive::Result<String> {
        let file = self.file(account, file_path).await?;
        if file.is_folder() {
            return Err(DriveError::NotAFile(path::normalize(file_path)));
        }
        Ok(format!("https://fake.example/{}/{}", account, file.name))
    }

    fn proxy_headers(&self, _account: &Account) -> ProxyHeaders {
        ProxyHeaders::default().remove("Origin")
    }

    fn invalidate(&self, _account: &str, _path: &str) -> usize {
        1
    }
}

struct Harness {
    service: DriveService,
    accounts: MemoryAccounts,
}

async fn harness_with(accounts: MemoryAccounts) -> Harness {
    let config = CoreConfig::builder()
        .http_client(Arc::new(NullHttp))
        .account_store(Arc::new(accounts.clone()))
        .settings_store(Arc::new(MemorySettings::default()))
        .default_page_size(2)
        .build()
        .await
        .unwrap();
    let drivers = DriverRegistry::builder()
        .register("Fake", FakeDriver::factory)
        .build();
    Harness {
        service: DriveService::new(config, drivers).await.unwrap(),
        accounts,
    }
}

async fn harness() -> Harness {
    harness_with(MemoryAccounts::default()).await
}

fn account(name: &str, index: i32) -> Account {
    let mut account = Account::new(name, "Fake");
    account.index = index;
    account.order_by = "name".to_string();
    account.order_direction = "asc".to_string();
    account.extract_folder = "front".to_string();
    account
}

fn names(files: &[File]) -> Vec<&str> {
    files.iter().map(|f| f.name.as_str()).collect()
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<CoreEvent>) -> Vec<CoreEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ============================================================================
// Public operations
// ============================================================================

#[tokio::test]
async fn test_root_lists_accounts_in_index_order() {
    let h = harness().await;
    h.service.create_account(account("music", 2)).await.unwrap();
    h.service.create_account(account("home", 1)).await.unwrap();

    let listing = h.service.list("/", ListOptions::default()).await.unwrap();

    assert_eq!(names(&listing.files), vec!["home", "music"]);
    assert!(listing.files.iter().all(File::is_folder));
    assert_eq!(listing.total, 2);
    assert!(listing.password.is_none());
}

#[tokio::test]
async fn test_listing_pipeline() {
    let h = harness().await;
    h.service.seed_settings().await.unwrap();
    h.service.create_account(account("home", 0)).await.unwrap();

    let listing = h.service.list("/home", ListOptions::default()).await.unwrap();

    // marker removed, sorted by name, folders first
    assert_eq!(names(&listing.files), vec!["docs", "README.md", "a.txt", "b.txt"]);
    assert_eq!(listing.password.as_deref(), Some("xhf"));
    assert_eq!(listing.total, 4);
    assert_eq!(listing.readme.map(|f| f.name), Some("README.md".to_string()));
}

#[tokio::test]
async fn test_unordered_listing_keeps_provider_order() {
    let h = harness().await;
    h.service
        .create_account(Account::new("home", "Fake"))
        .await
        .unwrap();

    let listing = h.service.list("/home", ListOptions::default()).await.unwrap();

    assert_eq!(names(&listing.files), vec!["b.txt", "docs", "a.txt", "README.md"]);
}

#[tokio::test]
async fn test_folder_placement_follows_account() {
    let h = harness().await;
    let mut front = Account::new("front", "Fake");
    front.extract_folder = "front".to_string();
    let mut back = account("back", 1);
    back.extract_folder = "back".to_string();
    h.service.create_account(front).await.unwrap();
    h.service.create_account(back).await.unwrap();

    let listing = h.service.list("/front", ListOptions::default()).await.unwrap();
    assert_eq!(names(&listing.files), vec!["docs", "b.txt", "a.txt", "README.md"]);

    let listing = h.service.list("/back", ListOptions::default()).await.unwrap();
    assert_eq!(names(&listing.files), vec!["README.md", "a.txt", "b.txt", "docs"]);
}

#[tokio::test]
async fn test_listing_pages() {
    let h = harness().await;
    h.service.create_account(account("home", 0)).await.unwrap();

    let second = h.service.list("/home", ListOptions::page(2, 3)).await.unwrap();
    assert_eq!(names(&second.files), vec!["b.txt"]);
    assert_eq!(second.total, 4);

    // no size: configured default of 2
    let first = h.service.list("/home", ListOptions::page(1, 0)).await.unwrap();
    assert_eq!(names(&first.files), vec!["docs", "README.md"]);

    let err = h.service.list("/home", ListOptions::page(0, 5)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Drive(DriveError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_readme_needs_setting() {
    let h = harness().await;
    h.service.create_account(account("home", 0)).await.unwrap();

    let listing = h.service.list("/home", ListOptions::default()).await.unwrap();
    assert!(listing.readme.is_none());
}

#[tokio::test]
async fn test_stat_and_link_through_mounts() {
    let h = harness().await;
    h.service.create_account(account("media/home", 0)).await.unwrap();

    let file = h.service.stat("/media/home/a.txt").await.unwrap();
    assert_eq!(file.size, 10);

    let mount = h.service.stat("/media").await.unwrap();
    assert!(mount.is_folder());
    assert_eq!(mount.name, "media");

    let url = h.service.link("/media/home/docs/c.txt").await.unwrap();
    assert_eq!(url, "https://fake.example/media/home/c.txt");
}

#[tokio::test]
async fn test_link_on_folders_fails() {
    let h = harness().await;
    h.service.create_account(account("media/home", 0)).await.unwrap();

    let err = h.service.link("/media/home/docs").await.unwrap_err();
    assert!(matches!(err, ServiceError::Drive(DriveError::NotAFile(_))));

    let err = h.service.link("/media").await.unwrap_err();
    assert!(matches!(err, ServiceError::Drive(DriveError::NotAFile(_))));
}

#[tokio::test]
async fn test_unknown_paths() {
    let h = harness().await;

    let err = h.service.list("/", ListOptions::default()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NoAccounts));

    h.service.create_account(account("home", 0)).await.unwrap();
    let err = h.service.list("/elsewhere", ListOptions::default()).await.unwrap_err();
    assert!(err.is_not_found());

    let err = h.service.stat("/home/missing.txt").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_preview_defaults_to_not_supported() {
    let h = harness().await;
    h.service.create_account(account("home", 0)).await.unwrap();

    let err = h.service.preview("/home/a.txt").await.unwrap_err();
    assert!(matches!(err, ServiceError::Drive(DriveError::NotSupported(_))));
}

#[tokio::test]
async fn test_proxy_settings() {
    let h = harness().await;
    let mut proxied = account("home", 0);
    proxied.proxy = true;
    h.service.create_account(proxied).await.unwrap();

    let headers = h.service.proxy_headers("home").await.unwrap();
    assert_eq!(headers.remove, vec!["Origin".to_string()]);
    assert!(h.service.requires_proxy("home").await.unwrap());
}

#[tokio::test]
async fn test_down_proxy_link() {
    let h = harness().await;
    let mut proxied = account("media/home", 0);
    proxied.down_proxy_url = "https://dl.example.com/\nhttps://backup.example.com".to_string();
    h.service.create_account(proxied).await.unwrap();
    h.service.create_account(account("plain", 1)).await.unwrap();

    assert_eq!(
        h.service.down_proxy_link("/media/home/docs/c.txt").await.unwrap(),
        Some("https://dl.example.com/media/home/docs/c.txt".to_string())
    );
    assert_eq!(h.service.down_proxy_link("/plain/a.txt").await.unwrap(), None);
    assert!(h.service.down_proxy_link("/media").await.is_err());
}

#[tokio::test]
async fn test_invalidate_emits_cache_event() {
    let h = harness().await;
    h.service.create_account(account("home", 0)).await.unwrap();
    let mut rx = h.service.events().subscribe();

    assert_eq!(h.service.invalidate("/home/docs").await.unwrap(), 1);

    assert_eq!(
        drain(&mut rx),
        vec![CoreEvent::Cache(CacheEvent::Invalidated {
            account: "home".to_string(),
            path: Some("/docs".to_string()),
        })]
    );
}

// ============================================================================
// Admin operations
// ============================================================================

#[tokio::test]
async fn test_create_account_bootstraps_and_persists() {
    let h = harness().await;
    let mut rx = h.service.events().subscribe();

    let created = h.service.create_account(account("home", 0)).await.unwrap();

    assert_eq!(created.status, "work");
    assert_eq!(created.access_token, "token-home");
    assert_eq!(created.root_folder, "/");
    assert_eq!(h.accounts.record("home").unwrap().access_token, "token-home");

    let events = drain(&mut rx);
    assert!(matches!(
        events.first(),
        Some(CoreEvent::Account(AccountEvent::Created { .. }))
    ));
    assert!(events.contains(&CoreEvent::Account(AccountEvent::TokenRefreshed {
        account: "home".to_string()
    })));
}

#[tokio::test]
async fn test_rejected_login_is_kept_as_status() {
    let h = harness().await;
    let mut bad = account("home", 0);
    bad.password = "wrong".to_string();

    let created = h.service.create_account(bad).await.unwrap();

    assert_eq!(created.status, "wrong password");
    assert_eq!(h.accounts.record("home").unwrap().status, "wrong password");
}

#[tokio::test]
async fn test_create_account_validation() {
    let h = harness().await;
    h.service.create_account(account("home", 0)).await.unwrap();

    let err = h.service.create_account(account("home", 1)).await.unwrap_err();
    assert!(matches!(err, ServiceError::AccountExists(_)));

    let err = h
        .service
        .create_account(Account::new("x", "Nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Drive(DriveError::UnknownDriver(_))));

    let mut huge = account("y", 0);
    huge.limit = 1000;
    let err = h.service.create_account(huge).await.unwrap_err();
    assert!(matches!(err, ServiceError::Drive(DriveError::InvalidAccount(_))));
    assert!(h.accounts.record("y").is_none());

    let err = h.service.create_account(account(" ", 0)).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_concurrent_creates_claim_one_name() {
    let h = harness().await;
    let mut first = account("home", 1);
    first.username = "first".to_string();
    let mut second = account("home", 2);
    second.username = "second".to_string();

    let (a, b) = tokio::join!(
        h.service.create_account(first),
        h.service.create_account(second)
    );

    let (winner, loser) = match (a, b) {
        (Ok(winner), Err(loser)) | (Err(loser), Ok(winner)) => (winner, loser),
        other => panic!("expected exactly one success: {:?}", other),
    };
    assert!(matches!(loser, ServiceError::AccountExists(_)));
    assert_eq!(h.accounts.record("home").unwrap().username, winner.username);
    assert_eq!(h.service.account("home").await.unwrap().username, winner.username);
}

#[tokio::test]
async fn test_failed_save_releases_name() {
    let h = harness().await;
    h.accounts.fail_saves();

    let err = h.service.create_account(account("home", 0)).await.unwrap_err();

    assert!(matches!(err, ServiceError::Storage(_)));
    assert!(h.service.accounts().await.is_empty());
    assert!(h.accounts.record("home").is_none());
}

#[tokio::test]
async fn test_rename_account() {
    let h = harness().await;
    h.service.create_account(account("home", 0)).await.unwrap();
    let mut rx = h.service.events().subscribe();

    let renamed = h
        .service
        .update_account("home", account("house", 0))
        .await
        .unwrap();

    assert_eq!(renamed.name, "house");
    assert_eq!(h.accounts.names(), vec!["house".to_string()]);
    assert!(matches!(
        h.service.account("home").await,
        Err(ServiceError::AccountNotFound(_))
    ));

    let events = drain(&mut rx);
    assert!(events.contains(&CoreEvent::Cache(CacheEvent::Invalidated {
        account: "home".to_string(),
        path: None,
    })));
    assert!(events.contains(&CoreEvent::Account(AccountEvent::Deleted {
        account: "home".to_string()
    })));

    let listing = h.service.list("/house", ListOptions::default()).await.unwrap();
    assert_eq!(listing.total, 4);
}

#[tokio::test]
async fn test_rename_onto_existing_account_fails() {
    let h = harness().await;
    h.service.create_account(account("home", 0)).await.unwrap();
    h.service.create_account(account("work", 1)).await.unwrap();

    let err = h
        .service
        .update_account("home", account("work", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AccountExists(_)));
    assert_eq!(
        h.accounts.names(),
        vec!["home".to_string(), "work".to_string()]
    );
}

#[tokio::test]
async fn test_delete_account() {
    let h = harness().await;
    h.service.create_account(account("home", 0)).await.unwrap();

    h.service.delete_account("home").await.unwrap();

    assert!(h.accounts.names().is_empty());
    assert!(h.service.accounts().await.is_empty());
    assert!(matches!(
        h.service.delete_account("home").await,
        Err(ServiceError::AccountNotFound(_))
    ));
}

#[tokio::test]
async fn test_startup_loads_stored_accounts_and_refreshes_all() {
    let store = MemoryAccounts::default();
    store.save(&account("home", 0)).await.unwrap();
    store.save(&Account::new("legacy", "Retired")).await.unwrap();

    let h = harness_with(store).await;
    assert_eq!(h.service.accounts().await.len(), 2);

    let outcomes: HashMap<String, bool> = h
        .service
        .refresh_all()
        .await
        .into_iter()
        .map(|(name, outcome)| (name, outcome.is_ok()))
        .collect();

    assert_eq!(outcomes.get("home"), Some(&true));
    assert_eq!(outcomes.get("legacy"), Some(&false));
    assert_eq!(h.accounts.record("home").unwrap().status, "work");
}

#[tokio::test]
async fn test_login_single_account() {
    let store = MemoryAccounts::default();
    store.save(&account("home", 0)).await.unwrap();
    let h = harness_with(store).await;

    let account = h.service.login("home").await.unwrap();
    assert_eq!(account.access_token, "token-home");
}

#[tokio::test]
async fn test_driver_schemas() {
    let h = harness().await;
    let schemas = h.service.driver_schemas();

    assert_eq!(schemas.len(), 1);
    assert_eq!(schemas[0].config.name, "Fake");
    assert!(schemas[0].config.local_sort);
    assert!(schemas[0].items[0].required);
    let fields: Vec<_> = schemas[0].items.iter().map(|item| item.name).collect();
    assert!(fields.contains(&"extract_folder"));
    assert!(fields.contains(&"down_proxy_url"));
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn test_seed_settings_keeps_existing_values() {
    let h = harness().await;
    h.service
        .save_settings(&[SettingItem::new(
            KEY_README_FILE,
            "index.md",
            SettingVisibility::Public,
        )])
        .await
        .unwrap();

    let written = h.service.seed_settings().await.unwrap();
    assert!(written > 0);
    assert_eq!(h.service.seed_settings().await.unwrap(), 0);

    let readme = h.service.setting(KEY_README_FILE).await.unwrap().unwrap();
    assert_eq!(readme.value, "index.md");
}

#[tokio::test]
async fn test_settings_visibility_and_delete() {
    let h = harness().await;
    h.service.seed_settings().await.unwrap();

    let public = h
        .service
        .settings(Some(SettingVisibility::Public))
        .await
        .unwrap();
    assert!(public.iter().all(|i| i.visibility == SettingVisibility::Public));
    assert!(!public.iter().any(|i| i.key == KEY_PASSWORD));

    h.service.delete_setting(KEY_PASSWORD).await.unwrap();
    assert!(h.service.setting(KEY_PASSWORD).await.unwrap().is_none());

    let err = h
        .service
        .save_settings(&[SettingItem::new("", "x", SettingVisibility::Public)])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidRequest(_)));
}
