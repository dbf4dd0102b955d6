//! Path resolution over cached listings.
//!
//! A path is resolved by listing its parent (from the cache, or through the
//! [`Pager`] on a miss) and scanning that listing for the leaf name. The
//! root short-circuits to the account's configured root id.

use bridge_traits::Account;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::cache::DirectoryCache;
use crate::error::{DriveError, Result};
use crate::models::NativeEntry;
use crate::pager::{PageSource, Pager};
use crate::path;

/// Result of resolving one path.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<E> {
    /// The mount root, carrying its native id
    Root(String),
    Entry(E),
}

impl<E: NativeEntry> Resolved<E> {
    pub fn native_id(&self) -> &str {
        match self {
            Resolved::Root(id) => id,
            Resolved::Entry(entry) => entry.native_id(),
        }
    }

    pub fn is_folder(&self) -> bool {
        match self {
            Resolved::Root(_) => true,
            Resolved::Entry(entry) => entry.is_folder(),
        }
    }
}

pub struct PathResolver<S: PageSource> {
    source: Arc<S>,
    cache: DirectoryCache<S::Entry>,
}

impl<S: PageSource> PathResolver<S> {
    pub fn new(source: Arc<S>, cache_capacity: usize) -> Self {
        Self {
            source,
            cache: DirectoryCache::new(cache_capacity),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn cache(&self) -> &DirectoryCache<S::Entry> {
        &self.cache
    }

    /// Complete native listing of the folder at `path`.
    pub fn list<'a>(
        &'a self,
        account: &'a Account,
        path: &'a str,
    ) -> BoxFuture<'a, Result<Arc<Vec<S::Entry>>>> {
        Box::pin(async move {
            let path = path::normalize(path);
            if let Some(hit) = self.cache.get(&account.name, &path) {
                return Ok(hit);
            }

            let folder_id = match self.resolve(account, &path).await? {
                Resolved::Root(id) => id,
                Resolved::Entry(entry) if entry.is_folder() => entry.native_id().to_string(),
                Resolved::Entry(_) => return Err(DriveError::NotAFolder(path)),
            };

            debug!(
                driver = self.source.driver_name(),
                account = %account.name,
                path = %path,
                "Listing cache miss"
            );
            let entries = Pager::new(self.source.as_ref())
                .drain(account, &folder_id)
                .await?;
            Ok(self.cache.put(&account.name, &path, entries))
        })
    }

    /// Finds the native record at `path`.
    pub async fn resolve(&self, account: &Account, path: &str) -> Result<Resolved<S::Entry>> {
        let path = path::normalize(path);
        if path == "/" {
            return Ok(Resolved::Root(self.source.root_id(account)));
        }

        let (parent, name) = path::split(&path);
        let siblings = self.list(account, &parent).await?;
        siblings
            .iter()
            .find(|entry| entry.name() == name)
            .cloned()
            .map(Resolved::Entry)
            .ok_or(DriveError::PathNotFound(path))
    }

    /// Resolves `path` for link generation; folders fail with
    /// [`DriveError::NotAFile`].
    #[instrument(skip(self, account), fields(account = %account.name))]
    pub async fn link_target(&self, account: &Account, path: &str) -> Result<S::Entry> {
        match self.resolve(account, path).await? {
            Resolved::Entry(entry) if !entry.is_folder() => Ok(entry),
            _ => Err(DriveError::NotAFile(path::normalize(path))),
        }
    }

    pub fn invalidate(&self, account: &str, path: &str) -> usize {
        self.cache.invalidate(account, path)
    }
}
