//! # AliDrive Provider
//!
//! Driver for the AliDrive (aliyundrive.com) v2 web API.
//!
//! - Login: JSON refresh-token grant; the first login also records the
//!   account's `default_drive_id`
//! - Listing: `file/list`, up to 200 entries per page, `next_marker` cursor
//! - Expired session: `code` `AccessTokenInvalid`
//! - Links: `file/get_download_url`, valid for four hours
//! - Preview: office preview URL for documents, transcoding info for videos
//! - Proxy: `Origin` stripped, `Referer` set to the web client

pub mod api;
pub mod driver;
pub mod types;

pub use api::{AliDriveApi, DRIVER_NAME};
pub use driver::AliDriveDriver;
