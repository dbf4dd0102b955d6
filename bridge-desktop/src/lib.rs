//! # Desktop Bridge Implementations
//!
//! Default implementations of the bridge traits for desktop and server hosts.
//!
//! - `HttpClient` using `reqwest` (browser user agent, redirect-aware)
//! - `AccountStore` and `SettingsStore` backed by SQLite through `sqlx`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteAccountStore, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let accounts = SqliteAccountStore::new("data/data.db".as_ref()).await?;
//!     let settings = SqliteSettingsStore::new("data/data.db".as_ref()).await?;
//!     Ok(())
//! }
//! ```

mod accounts;
mod db;
mod http;
mod settings;

pub use accounts::SqliteAccountStore;
pub use db::{memory_pool, open_pool};
pub use http::{ReqwestHttpClient, BROWSER_USER_AGENT};
pub use settings::SqliteSettingsStore;
