//! # Pager
//!
//! Drains a provider's paginated listing endpoint into one collection.
//!
//! Providers page either by number (189 Cloud) or by an opaque marker
//! (123Pan, AliDrive, Google Drive, OneDrive). A [`PageSource`] hides the
//! difference behind [`PageCursor`]. When a page reports an expired
//! session, the pager re-authenticates and restarts the walk from the first
//! page; it restarts at most once per drain.

use async_trait::async_trait;
use bridge_traits::Account;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::NativeEntry;

/// Position in a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    Start,
    Number(u32),
    Marker(String),
}

/// One page of native records.
#[derive(Debug, Clone)]
pub struct Page<E> {
    pub entries: Vec<E>,
    /// `None` on the last page
    pub next: Option<PageCursor>,
}

impl<E> Page<E> {
    pub fn last(entries: Vec<E>) -> Self {
        Self {
            entries,
            next: None,
        }
    }

    pub fn more(entries: Vec<E>, next: PageCursor) -> Self {
        Self {
            entries,
            next: Some(next),
        }
    }
}

/// A provider's listing endpoint.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Entry: NativeEntry;

    /// Provider tag written into normalized files
    fn driver_name(&self) -> &'static str;

    /// Native id of the account's mount root
    fn root_id(&self, account: &Account) -> String;

    /// Fetches one page of `parent_id`'s children.
    ///
    /// Must return `DriveError::SessionExpired` when the provider reports
    /// its expiry sentinel.
    async fn fetch_page(
        &self,
        account: &Account,
        parent_id: &str,
        cursor: &PageCursor,
    ) -> Result<Page<Self::Entry>>;

    /// Logs in again after `account`'s session expired, returning the
    /// refreshed account.
    async fn reauthenticate(&self, account: &Account) -> Result<Account>;
}

pub struct Pager<'a, S: PageSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: PageSource + ?Sized> Pager<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Collects every page of `parent_id` in provider order.
    pub async fn drain(&self, account: &Account, parent_id: &str) -> Result<Vec<S::Entry>> {
        let mut account = account.clone();
        let mut restarted = false;

        'walk: loop {
            let mut entries = Vec::new();
            let mut cursor = PageCursor::Start;
            let mut pages = 0u32;

            loop {
                match self.source.fetch_page(&account, parent_id, &cursor).await {
                    Ok(page) => {
                        pages += 1;
                        entries.extend(page.entries);
                        match page.next {
                            Some(next) => cursor = next,
                            None => {
                                debug!(
                                    driver = self.source.driver_name(),
                                    parent_id,
                                    pages,
                                    entries = entries.len(),
                                    "Listing drained"
                                );
                                return Ok(entries);
                            }
                        }
                    }
                    Err(err) if err.is_session_expired() && !restarted => {
                        warn!(
                            driver = self.source.driver_name(),
                            account = %account.name,
                            pages,
                            "Session expired mid-listing, restarting from the first page"
                        );
                        restarted = true;
                        account = self.source.reauthenticate(&account).await?;
                        continue 'walk;
                    }
                    Err(err) => return Err(err.surfaced()),
                }
            }
        }
    }
}
