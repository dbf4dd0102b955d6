//! # Event Bus System
//!
//! Typed notifications between the drive core and its host, carried over a
//! `tokio::sync::broadcast` channel.
//!
//! ## Overview
//!
//! - **Account events**: created, updated, deleted, status changes and token
//!   refreshes
//! - **Cache events**: directory listings dropped from the cache
//!
//! Emitting with no subscribers is not an error for callers; the bus simply
//! reports zero receivers.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{AccountEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Account(AccountEvent::TokenRefreshed {
//!     account: "home".to_string(),
//! }));
//!
//! let event = rx.recv().await.unwrap();
//! assert_eq!(event.account(), Some("home"));
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast::{self, error::RecvError, Receiver};

/// Default buffer size for the event bus.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

// ============================================================================
// Core Event Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Account(AccountEvent),
    Cache(CacheEvent),
}

impl CoreEvent {
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Account(e) => e.description(),
            CoreEvent::Cache(e) => e.description(),
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Account(AccountEvent::StatusChanged { working: false, .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Account(AccountEvent::Created { .. })
            | CoreEvent::Account(AccountEvent::Deleted { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// Account the event concerns
    pub fn account(&self) -> Option<&str> {
        match self {
            CoreEvent::Account(AccountEvent::Created { account, .. })
            | CoreEvent::Account(AccountEvent::Updated { account })
            | CoreEvent::Account(AccountEvent::Deleted { account })
            | CoreEvent::Account(AccountEvent::StatusChanged { account, .. })
            | CoreEvent::Account(AccountEvent::TokenRefreshed { account })
            | CoreEvent::Cache(CacheEvent::Invalidated { account, .. }) => Some(account),
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Account Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AccountEvent {
    Created {
        account: String,
        provider: String,
    },
    Updated {
        account: String,
    },
    Deleted {
        account: String,
    },
    /// Status string after a login/refresh attempt
    StatusChanged {
        account: String,
        status: String,
        working: bool,
    },
    TokenRefreshed {
        account: String,
    },
}

impl AccountEvent {
    fn description(&self) -> &str {
        match self {
            AccountEvent::Created { .. } => "Account created",
            AccountEvent::Updated { .. } => "Account updated",
            AccountEvent::Deleted { .. } => "Account deleted",
            AccountEvent::StatusChanged { .. } => "Account status changed",
            AccountEvent::TokenRefreshed { .. } => "Account credentials refreshed",
        }
    }
}

// ============================================================================
// Cache Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CacheEvent {
    /// Listings at `path` (or the whole account when `None`) were dropped
    Invalidated {
        account: String,
        path: Option<String>,
    },
}

impl CacheEvent {
    fn description(&self) -> &str {
        match self {
            CacheEvent::Invalidated { .. } => "Directory cache invalidated",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus; subscribers lagging by more than `capacity`
    /// events receive `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event and returns how many subscribers received it.
    pub fn emit(&self, event: CoreEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Each receiver sees every event emitted after it subscribed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional predicate.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Only events for one account
    pub fn for_account(self, account: impl Into<String>) -> Self {
        let account = account.into();
        self.filter(move |event| event.account() == Some(account.as_str()))
    }

    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            match &self.filter {
                Some(filter) if !filter(&event) => continue,
                _ => return Ok(event),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
