//! # Host Bridge Traits
//!
//! Capability traits the drive core needs from its host.
//!
//! ## Overview
//!
//! The core never talks to the network or a database directly. It depends on
//! the traits in this crate and the host injects concrete implementations
//! (`bridge-desktop` ships reqwest and SQLite based ones).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP with the shared transport retry policy
//!
//! ### Persistence
//! - [`AccountStore`](storage::AccountStore) - Save/load/delete account records by name
//! - [`SettingsStore`](storage::SettingsStore) - Settings items with a visibility class
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Transport
//! implementations must report timeouts as [`BridgeError::Timeout`] so the
//! retry loop can recognise them.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`; one instance is shared by every
//! account and request.

pub mod error;
pub mod http;
pub mod logging;
pub mod storage;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use logging::{LogEntry, LogLevel, LoggerSink, MemoryLogger};
pub use storage::{Account, AccountStore, SettingItem, SettingVisibility, SettingsStore};
