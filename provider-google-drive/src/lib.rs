//! # Google Drive Provider
//!
//! Driver for Google Drive API v3.
//!
//! ## Overview
//!
//! - OAuth refresh-token grant (form encoded) with the account's client id
//!   and secret
//! - Folder listing by parent id, 1000 entries per page, `nextPageToken`
//!   cursor; shortcuts are shown as folders
//! - Expired session: HTTP-style error code 401
//! - Links are media URLs that need the bearer token, so the driver is
//!   proxy-only and the proxy injects `Authorization`

pub mod connector;
pub mod driver;
pub mod types;

pub use connector::{GoogleDriveConnector, DRIVER_NAME};
pub use driver::GoogleDriveDriver;
