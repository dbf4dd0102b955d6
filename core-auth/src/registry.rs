//! In-memory account registry.
//!
//! The registry holds the single authoritative copy of every account.
//! Drivers read snapshots from it and write credentials back through it,
//! so a refresh performed by one request is immediately visible to the next.

use bridge_traits::{Account, AccountStore};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AuthError, Result};
use crate::types::{Credentials, STATUS_WORKING};

#[derive(Clone, Default)]
pub struct AccountRegistry {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the registry contents with every record in `store`.
    pub async fn load_from(&self, store: &dyn AccountStore) -> Result<usize> {
        let records = store.list().await?;
        let mut accounts = self.accounts.write().await;
        accounts.clear();
        for account in records {
            accounts.insert(account.name.clone(), account);
        }
        debug!(count = accounts.len(), "Loaded accounts into registry");
        Ok(accounts.len())
    }

    /// Inserts or replaces an account, returning the previous record.
    pub async fn insert(&self, account: Account) -> Option<Account> {
        self.accounts
            .write()
            .await
            .insert(account.name.clone(), account)
    }

    /// Inserts `account` only when its name is free; the check and the
    /// insert happen under one write lock.
    pub async fn insert_new(&self, account: Account) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.name) {
            return Err(AuthError::AccountExists(account.name));
        }
        accounts.insert(account.name.clone(), account);
        Ok(())
    }

    /// Snapshot of one account.
    pub async fn get(&self, name: &str) -> Result<Account> {
        self.accounts
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| AuthError::AccountNotFound(name.to_string()))
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.accounts.read().await.contains_key(name)
    }

    pub async fn remove(&self, name: &str) -> Option<Account> {
        self.accounts.write().await.remove(name)
    }

    pub async fn names(&self) -> Vec<String> {
        self.list().await.into_iter().map(|a| a.name).collect()
    }

    /// All accounts ordered by `index`, then `name`.
    pub async fn list(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.accounts.read().await.values().cloned().collect();
        accounts.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.name.cmp(&b.name)));
        accounts
    }

    /// Writes fresh credentials and marks the account working.
    pub async fn apply_credentials(&self, name: &str, credentials: Credentials) -> Result<Account> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(name)
            .ok_or_else(|| AuthError::AccountNotFound(name.to_string()))?;

        account.access_token = credentials.access_token;
        if let Some(refresh_token) = credentials.refresh_token {
            account.refresh_token = refresh_token;
        }
        if let Some(drive_id) = credentials.drive_id {
            account.drive_id = drive_id;
        }
        account.status = STATUS_WORKING.to_string();
        account.updated_at = Some(Utc::now());
        Ok(account.clone())
    }

    /// Records a status string; tokens are left as they were.
    pub async fn set_status(&self, name: &str, status: impl Into<String>) -> Result<Account> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(name)
            .ok_or_else(|| AuthError::AccountNotFound(name.to_string()))?;
        account.status = status.into();
        Ok(account.clone())
    }
}

impl std::fmt::Debug for AccountRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountRegistry").finish_non_exhaustive()
    }
}
