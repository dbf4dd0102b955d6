//! Directory cache.
//!
//! Keeps the last complete native listing per `(account, path)`. Entries are
//! advisory: a miss simply means the listing is fetched again.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::trace;

use crate::path;

type CacheKey = (String, String);

pub struct DirectoryCache<E> {
    entries: Mutex<LruCache<CacheKey, Arc<Vec<E>>>>,
}

impl<E> DirectoryCache<E> {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, account: &str, path: &str) -> Option<Arc<Vec<E>>> {
        let key = (account.to_string(), path::normalize(path));
        self.entries.lock().get(&key).cloned()
    }

    /// Stores a complete listing. Empty listings are returned but not kept.
    pub fn put(&self, account: &str, path: &str, listing: Vec<E>) -> Arc<Vec<E>> {
        let listing = Arc::new(listing);
        if listing.is_empty() {
            return listing;
        }
        let key = (account.to_string(), path::normalize(path));
        trace!(account, path = %key.1, entries = listing.len(), "Caching listing");
        self.entries.lock().put(key, listing.clone());
        listing
    }

    /// Drops the listing at `path` and every listing below it.
    pub fn invalidate(&self, account: &str, path: &str) -> usize {
        let target = path::normalize(path);
        self.remove_where(|(acc, cached)| acc == account && path::is_within(cached, &target))
    }

    pub fn invalidate_account(&self, account: &str) -> usize {
        self.remove_where(|(acc, _)| acc == account)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove_where(&self, predicate: impl Fn(&CacheKey) -> bool) -> usize {
        let mut entries = self.entries.lock();
        let doomed: Vec<CacheKey> = entries
            .iter()
            .filter(|(key, _)| predicate(key))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        doomed.len()
    }
}
