//! # Authentication Manager
//!
//! Serialises logins and token refreshes per account and writes the outcome
//! back to the registry, the account store and the event bus.
//!
//! ## Overview
//!
//! Drivers implement [`Authenticator`] with their provider-specific login or
//! refresh call. The manager wraps every call with:
//!
//! - a per-account lock, so concurrent requests that all hit an expired
//!   session trigger one refresh instead of many
//! - a staleness check: a caller that waited on the lock while another caller
//!   refreshed reuses the fresh token
//! - persistence of the new credentials, or of the failure reason as the
//!   account status (prior tokens are kept)
//!
//! ## Usage
//!
//! ```ignore
//! use core_auth::{AccountRegistry, AuthManager};
//! use core_runtime::events::EventBus;
//!
//! let registry = AccountRegistry::new();
//! let manager = AuthManager::new(registry.clone(), account_store, EventBus::default());
//!
//! // After the provider answered with its session-expired code:
//! let account = manager.refresh(&snapshot, driver.as_ref()).await?;
//! ```

use async_trait::async_trait;
use bridge_traits::{Account, AccountStore};
use core_runtime::events::{AccountEvent, CoreEvent, EventBus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{AuthError, Result};
use crate::registry::AccountRegistry;
use crate::types::{AuthState, Credentials, STATUS_WORKING};

/// Provider-specific login or token refresh.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Obtains fresh credentials for `account`.
    ///
    /// Password providers log in again; OAuth providers exchange the stored
    /// refresh token. Errors carry the provider's message verbatim.
    async fn authenticate(&self, account: &Account) -> Result<Credentials>;
}

/// Coordinates credential refreshes for all accounts.
pub struct AuthManager {
    /// Authoritative in-memory accounts
    registry: AccountRegistry,

    /// Durable copy of every account
    store: Arc<dyn AccountStore>,

    /// Event bus for status and refresh notifications
    event_bus: EventBus,

    /// Per-account locks serialising refreshes
    refresh_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl AuthManager {
    pub fn new(registry: AccountRegistry, store: Arc<dyn AccountStore>, event_bus: EventBus) -> Self {
        Self {
            registry,
            store,
            event_bus,
            refresh_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    /// Refreshes credentials after the provider rejected the token carried
    /// by `used`, the snapshot the failed call was made with.
    ///
    /// If the registry already holds a different working token (another
    /// caller refreshed while this one waited), that account is returned
    /// without contacting the provider again.
    #[instrument(skip(self, used, authenticator), fields(account = %used.name))]
    pub async fn refresh(&self, used: &Account, authenticator: &dyn Authenticator) -> Result<Account> {
        self.run(&used.name, authenticator, Some(used.access_token.clone()))
            .await
    }

    /// Logs in unconditionally, used when an account is created, edited or
    /// loaded at startup.
    #[instrument(skip(self, authenticator), fields(account = %name))]
    pub async fn login(&self, name: &str, authenticator: &dyn Authenticator) -> Result<Account> {
        self.run(name, authenticator, None).await
    }

    /// Logs every account in again; one result per account, in registry
    /// order. A failing account does not stop the pass.
    pub async fn refresh_all<F>(&self, lookup: F) -> Vec<(String, Result<Account>)>
    where
        F: Fn(&Account) -> Option<Arc<dyn Authenticator>>,
    {
        let mut results = Vec::new();
        for account in self.registry.list().await {
            let outcome = match lookup(&account) {
                Some(authenticator) => self.login(&account.name, authenticator.as_ref()).await,
                None => {
                    let err = AuthError::login_failed(
                        account.provider.clone(),
                        format!("no driver registered for provider {}", account.provider),
                    );
                    if let Ok(updated) =
                        self.registry.set_status(&account.name, err.status_reason()).await
                    {
                        self.emit_status(&updated, false);
                    }
                    Err(err)
                }
            };
            results.push((account.name, outcome));
        }

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        info!(total = results.len(), failed, "Refreshed all accounts");
        results
    }

    /// Display state of one account. `Refreshing` while a login or refresh
    /// holds the account's lock; the stored status is only written once the
    /// provider answered, so a dropped refresh leaves it untouched.
    pub async fn state(&self, name: &str) -> Result<AuthState> {
        let account = self.registry.get(name).await?;
        let in_flight = self
            .refresh_locks
            .lock()
            .await
            .get(name)
            .map_or(false, |lock| lock.try_lock().is_err());
        Ok(if in_flight {
            AuthState::Refreshing
        } else {
            AuthState::from_status(&account.status)
        })
    }

    async fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.refresh_locks.lock().await;
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn run(
        &self,
        name: &str,
        authenticator: &dyn Authenticator,
        observed_token: Option<String>,
    ) -> Result<Account> {
        let lock = self.lock_for(name).await;
        let _guard = lock.lock().await;

        let account = self.registry.get(name).await?;
        if let Some(observed) = observed_token {
            if account.access_token != observed && account.status == STATUS_WORKING {
                debug!("Credentials refreshed by a concurrent caller");
                return Ok(account);
            }
        }

        let previous_status = account.status.clone();

        match authenticator.authenticate(&account).await {
            Ok(credentials) => {
                let updated = self.registry.apply_credentials(name, credentials).await?;
                self.persist(&updated).await?;

                info!(provider = %updated.provider, "Account credentials refreshed");
                self.event_bus
                    .emit(CoreEvent::Account(AccountEvent::TokenRefreshed {
                        account: name.to_string(),
                    }));
                if previous_status != STATUS_WORKING {
                    self.emit_status(&updated, true);
                }
                Ok(updated)
            }
            Err(err) => {
                let reason = err.status_reason();
                warn!(provider = %account.provider, error = %reason, "Account authentication failed");

                let updated = self.registry.set_status(name, reason).await?;
                if let Err(persist_err) = self.persist(&updated).await {
                    warn!(error = %persist_err, "Failed to persist account status");
                }
                self.emit_status(&updated, false);
                Err(err)
            }
        }
    }

    async fn persist(&self, account: &Account) -> Result<()> {
        self.store
            .save(account)
            .await
            .map_err(|e| AuthError::Persistence(e.to_string()))
    }

    fn emit_status(&self, account: &Account, working: bool) {
        self.event_bus
            .emit(CoreEvent::Account(AccountEvent::StatusChanged {
                account: account.name.clone(),
                status: account.status.clone(),
                working,
            }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use mockall::mock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    mock! {
        Auth {}

        #[async_trait]
        impl Authenticator for Auth {
            async fn authenticate(&self, account: &Account) -> Result<Credentials>;
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        saved: std::sync::Mutex<Vec<Account>>,
    }

    #[async_trait]
    impl AccountStore for RecordingStore {
        async fn save(&self, account: &Account) -> BridgeResult<()> {
            self.saved.lock().unwrap().push(account.clone());
            Ok(())
        }
        async fn get(&self, name: &str) -> BridgeResult<Option<Account>> {
            Ok(self
                .saved
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|a| a.name == name)
                .cloned())
        }
        async fn list(&self) -> BridgeResult<Vec<Account>> {
            Ok(self.saved.lock().unwrap().clone())
        }
        async fn delete(&self, _name: &str) -> BridgeResult<()> {
            Ok(())
        }
    }

    async fn setup() -> (AuthManager, Arc<RecordingStore>, EventBus) {
        let registry = AccountRegistry::new();
        let mut account = Account::new("ali", "AliDrive");
        account.access_token = "stale".to_string();
        account.refresh_token = "r0".to_string();
        account.status = STATUS_WORKING.to_string();
        registry.insert(account).await;

        let store = Arc::new(RecordingStore::default());
        let bus = EventBus::new(16);
        let manager = AuthManager::new(registry, store.clone(), bus.clone());
        (manager, store, bus)
    }

    #[tokio::test]
    async fn test_refresh_success_updates_registry_and_store() {
        let (manager, store, bus) = setup().await;
        let mut events = bus.subscribe();

        let mut auth = MockAuth::new();
        auth.expect_authenticate()
            .withf(|account| account.refresh_token == "r0")
            .times(1)
            .returning(|_| Ok(Credentials::new("fresh").with_refresh_token("r1")));

        let snapshot = manager.registry().get("ali").await.unwrap();
        let account = manager.refresh(&snapshot, &auth).await.unwrap();

        assert_eq!(account.access_token, "fresh");
        assert_eq!(account.refresh_token, "r1");
        assert_eq!(account.status, "work");
        assert_eq!(store.get("ali").await.unwrap().unwrap(), account);
        assert!(matches!(
            events.recv().await.unwrap(),
            CoreEvent::Account(AccountEvent::TokenRefreshed { .. })
        ));
    }

    #[tokio::test]
    async fn test_refresh_failure_records_reason_and_keeps_tokens() {
        let (manager, store, bus) = setup().await;
        let mut events = bus.subscribe();

        let mut auth = MockAuth::new();
        auth.expect_authenticate()
            .times(1)
            .returning(|_| Err(AuthError::TokenRefreshFailed("refresh token expired".into())));

        let snapshot = manager.registry().get("ali").await.unwrap();
        let err = manager.refresh(&snapshot, &auth).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenRefreshFailed(_)));

        let account = manager.registry().get("ali").await.unwrap();
        assert_eq!(account.status, "refresh token expired");
        assert_eq!(account.access_token, "stale");
        assert_eq!(store.get("ali").await.unwrap().unwrap().status, "refresh token expired");

        match events.recv().await.unwrap() {
            CoreEvent::Account(AccountEvent::StatusChanged { working, status, .. }) => {
                assert!(!working);
                assert_eq!(status, "refresh token expired");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    struct SlowAuth {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Authenticator for SlowAuth {
        async fn authenticate(&self, _account: &Account) -> Result<Credentials> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(Credentials::new(format!("fresh-{}", n)))
        }
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_share_one_provider_call() {
        let (manager, _store, _bus) = setup().await;
        let auth = SlowAuth {
            calls: AtomicUsize::new(0),
        };

        let snapshot = manager.registry().get("ali").await.unwrap();
        let (a, b) = tokio::join!(
            manager.refresh(&snapshot, &auth),
            manager.refresh(&snapshot, &auth)
        );

        assert_eq!(auth.calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap().access_token, "fresh-0");
        assert_eq!(b.unwrap().access_token, "fresh-0");
    }

    struct Hangs;

    #[async_trait]
    impl Authenticator for Hangs {
        async fn authenticate(&self, _account: &Account) -> Result<Credentials> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Credentials::new("never"))
        }
    }

    #[tokio::test]
    async fn test_cancelled_refresh_keeps_status_and_releases_lock() {
        let (manager, store, _bus) = setup().await;
        let snapshot = manager.registry().get("ali").await.unwrap();

        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            manager.refresh(&snapshot, &Hangs),
        )
        .await;
        assert!(outcome.is_err());

        let account = manager.registry().get("ali").await.unwrap();
        assert_eq!(account.status, "work");
        assert_eq!(account.access_token, "stale");
        assert!(store.saved.lock().unwrap().is_empty());
        assert_eq!(manager.state("ali").await.unwrap(), AuthState::Valid);

        let mut auth = MockAuth::new();
        auth.expect_authenticate()
            .times(1)
            .returning(|_| Ok(Credentials::new("fresh")));
        let account = manager.refresh(&snapshot, &auth).await.unwrap();
        assert_eq!(account.access_token, "fresh");
    }

    #[tokio::test]
    async fn test_state_is_refreshing_while_in_flight() {
        let (manager, _store, _bus) = setup().await;
        let auth = SlowAuth {
            calls: AtomicUsize::new(0),
        };
        let snapshot = manager.registry().get("ali").await.unwrap();

        let (refreshed, during) = tokio::join!(manager.refresh(&snapshot, &auth), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            manager.state("ali").await.unwrap()
        });

        assert_eq!(during, AuthState::Refreshing);
        assert_eq!(refreshed.unwrap().status, "work");
        assert_eq!(manager.state("ali").await.unwrap(), AuthState::Valid);
    }

    #[tokio::test]
    async fn test_login_always_contacts_provider() {
        let (manager, _store, _bus) = setup().await;
        let mut auth = MockAuth::new();
        auth.expect_authenticate()
            .times(2)
            .returning(|_| Ok(Credentials::new("fresh")));

        manager.login("ali", &auth).await.unwrap();
        manager.login("ali", &auth).await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_all_continues_past_failures() {
        let (manager, _store, _bus) = setup().await;
        manager
            .registry()
            .insert(Account::new("orphan", "Unknown"))
            .await;

        let results = manager
            .refresh_all(|account| {
                if account.provider == "AliDrive" {
                    let mut auth = MockAuth::new();
                    auth.expect_authenticate()
                        .returning(|_| Ok(Credentials::new("fresh")));
                    Some(Arc::new(auth) as Arc<dyn Authenticator>)
                } else {
                    None
                }
            })
            .await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|(name, r)| name == "ali" && r.is_ok()));
        assert!(results.iter().any(|(name, r)| name == "orphan" && r.is_err()));
        assert_eq!(
            manager.registry().get("orphan").await.unwrap().status,
            "no driver registered for provider Unknown"
        );
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let (manager, _store, _bus) = setup().await;
        let auth = MockAuth::new();
        assert!(matches!(
            manager.refresh(&Account::new("missing", "AliDrive"), &auth).await,
            Err(AuthError::AccountNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stale_snapshot_reuses_newer_token() {
        let (manager, _store, _bus) = setup().await;
        let stale = manager.registry().get("ali").await.unwrap();
        manager
            .registry()
            .apply_credentials("ali", Credentials::new("already-fresh"))
            .await
            .unwrap();

        let auth = MockAuth::new();
        let account = manager.refresh(&stale, &auth).await.unwrap();
        assert_eq!(account.access_token, "already-fresh");
    }
}
