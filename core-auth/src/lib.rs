//! # Account Authentication
//!
//! Account registry and credential refresh coordination for the drive core.
//!
//! ## Overview
//!
//! - [`AccountRegistry`] keeps the authoritative, shared copy of every
//!   configured account
//! - [`Authenticator`] is implemented by each driver with its provider's
//!   login or token refresh call
//! - [`AuthManager`] serialises refreshes per account, persists the outcome
//!   and publishes account events
//!
//! Status strings follow one convention: `"work"` after a successful login,
//! otherwise the provider's failure message verbatim.

pub mod error;
pub mod manager;
pub mod registry;
pub mod types;

pub use error::{AuthError, Result};
pub use manager::{AuthManager, Authenticator};
pub use registry::AccountRegistry;
pub use types::{AuthState, Credentials, STATUS_WORKING};
