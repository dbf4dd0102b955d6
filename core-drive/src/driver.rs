//! # Driver Contract
//!
//! One [`Driver`] per provider type. A driver is created once per process
//! and serves every account of its provider; per-account state lives in the
//! shared [`AccountRegistry`] or in maps keyed by account name.
//!
//! Most drivers are a [`PageSource`] plus provider link logic. They embed a
//! [`DriverContext`], which owns the path resolver and its directory cache
//! and turns account names into fresh account snapshots.

use async_trait::async_trait;
use bridge_traits::{Account, HttpClient, RetryPolicy};
use core_auth::{AccountRegistry, AuthManager, Authenticator, Credentials};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{DriveError, Result};
use crate::models::{normalize, normalize_all, File};
use crate::pager::PageSource;
use crate::path;
use crate::resolver::{PathResolver, Resolved};

/// Static description of a driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverConfig {
    pub name: &'static str,
    /// File bodies must be streamed through the proxy (no hot-linking)
    pub only_proxy: bool,
    /// Listings arrive unsorted and must be ordered locally
    pub local_sort: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    String,
    Bool,
    Select,
    Number,
}

/// One account field shown by the admin form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormItem {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FormKind,
    /// Choices for `Select`
    pub values: Vec<&'static str>,
    pub required: bool,
    pub description: &'static str,
}

impl FormItem {
    fn new(name: &'static str, label: &'static str, kind: FormKind) -> Self {
        Self {
            name,
            label,
            kind,
            values: Vec::new(),
            required: false,
            description: "",
        }
    }

    pub fn string(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FormKind::String)
    }

    pub fn number(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FormKind::Number)
    }

    pub fn bool(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FormKind::Bool)
    }

    pub fn select(name: &'static str, label: &'static str, values: &[&'static str]) -> Self {
        Self {
            values: values.to_vec(),
            ..Self::new(name, label, FormKind::Select)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

/// Account fields every provider accepts, appended to each driver's own
/// items in the admin form.
pub fn common_items() -> Vec<FormItem> {
    vec![
        FormItem::select("extract_folder", "folders placement", &["front", "back"])
            .describe("empty keeps the provider's order"),
        FormItem::bool("proxy", "proxy downloads"),
        FormItem::string("down_proxy_url", "download proxy url"),
    ]
}

/// Header edits a reverse proxy applies when streaming a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProxyHeaders {
    pub set: Vec<(String, String)>,
    pub remove: Vec<String>,
}

impl ProxyHeaders {
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set.push((name.into(), value.into()));
        self
    }

    pub fn remove(mut self, name: impl Into<String>) -> Self {
        self.remove.push(name.into());
        self
    }
}

/// Shared collaborators handed to every driver factory.
#[derive(Clone)]
pub struct DriverDeps {
    pub http: Arc<dyn HttpClient>,
    pub retry: RetryPolicy,
    pub accounts: AccountRegistry,
    pub auth: Arc<AuthManager>,
    pub cache_capacity: usize,
}

impl DriverDeps {
    pub fn new(http: Arc<dyn HttpClient>, auth: Arc<AuthManager>, cache_capacity: usize) -> Self {
        Self {
            http,
            retry: RetryPolicy::default(),
            accounts: auth.registry().clone(),
            auth,
            cache_capacity,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// A provider backend.
#[async_trait]
pub trait Driver: Authenticator {
    fn config(&self) -> DriverConfig;

    /// Account fields for the admin form
    fn items(&self) -> Vec<FormItem>;

    /// Applies defaults and validates an account before it is bootstrapped.
    fn prepare(&self, account: &mut Account) -> Result<()>;

    /// Metadata for one path; the root is reported as a folder
    async fn file(&self, account: &str, path: &str) -> Result<File>;

    /// Normalized listing of the folder at `path`, in provider order
    async fn files(&self, account: &str, path: &str) -> Result<Vec<File>>;

    /// Direct URL for the file at `path`
    async fn link(&self, account: &str, path: &str) -> Result<String>;

    fn proxy_headers(&self, account: &Account) -> ProxyHeaders;

    /// Provider-specific preview data
    async fn preview(&self, _account: &str, _path: &str) -> Result<serde_json::Value> {
        Err(DriveError::NotSupported(format!(
            "{} has no preview",
            self.config().name
        )))
    }

    /// Drops cached listings at `path` and below
    fn invalidate(&self, account: &str, path: &str) -> usize;

    /// Drops every piece of per-account state (cache, sessions)
    fn forget_account(&self, account: &str) {
        self.invalidate(account, "/");
    }
}

/// Lets a shared driver handle be passed where an [`Authenticator`] is
/// expected.
pub struct DriverAuthenticator(pub Arc<dyn Driver>);

#[async_trait]
impl Authenticator for DriverAuthenticator {
    async fn authenticate(&self, account: &Account) -> core_auth::Result<Credentials> {
        self.0.authenticate(account).await
    }
}

/// Path resolution and account lookup shared by drivers.
pub struct DriverContext<S: PageSource> {
    deps: DriverDeps,
    resolver: PathResolver<S>,
}

impl<S: PageSource> DriverContext<S> {
    pub fn new(deps: DriverDeps, source: Arc<S>) -> Self {
        let resolver = PathResolver::new(source, deps.cache_capacity);
        Self { deps, resolver }
    }

    pub fn deps(&self) -> &DriverDeps {
        &self.deps
    }

    pub fn source(&self) -> &Arc<S> {
        self.resolver.source()
    }

    pub fn resolver(&self) -> &PathResolver<S> {
        &self.resolver
    }

    /// Current snapshot of `name` from the registry
    pub async fn account(&self, name: &str) -> Result<Account> {
        Ok(self.deps.accounts.get(name).await?)
    }

    pub async fn files(&self, name: &str, path: &str) -> Result<Vec<File>> {
        let account = self.account(name).await?;
        let entries = self.resolver.list(&account, path).await?;
        Ok(normalize_all(&entries, self.source().driver_name()))
    }

    pub async fn file(&self, name: &str, path: &str) -> Result<File> {
        let account = self.account(name).await?;
        match self.resolver.resolve(&account, path).await? {
            Resolved::Root(id) => {
                let mut root = File::folder(account.name.clone(), self.source().driver_name());
                root.id = id;
                root.updated_at = account.updated_at;
                Ok(root)
            }
            Resolved::Entry(entry) => Ok(normalize(&entry, self.source().driver_name())),
        }
    }

    /// Account snapshot and native record of the file at `path`.
    ///
    /// The snapshot is taken after resolution, so credentials renewed while
    /// listing parent folders are already in it.
    pub async fn link_target(&self, name: &str, path: &str) -> Result<(Account, S::Entry)> {
        let account = self.account(name).await?;
        let entry = self.resolver.link_target(&account, path).await?;
        Ok((self.account(name).await?, entry))
    }

    /// Refreshes `used` through the auth manager with `authenticator`.
    pub async fn refresh(&self, used: &Account, authenticator: &dyn Authenticator) -> Result<Account> {
        Ok(self.deps.auth.refresh(used, authenticator).await?)
    }

    pub fn invalidate(&self, name: &str, path: &str) -> usize {
        self.resolver.invalidate(name, &path::normalize(path))
    }
}
