//! # 189 Cloud Provider
//!
//! Driver for the China Telecom 189 Cloud web API.
//!
//! - Login: scraped login page, credentials RSA-encrypted with the page key,
//!   then the cookie session from the redirect chain is kept per account
//! - Listing: `listFiles.action`, 60 entries per page until a page is empty
//! - Expired session: `errorCode` `InvalidSessionKey`
//! - Links: `getFileDownloadUrl.action`, then one non-following request for
//!   the storage node redirect
//! - Proxy: the `Origin` header is stripped

pub mod api;
pub mod crypto;
pub mod driver;
pub mod login;
pub mod session;
pub mod types;

pub use api::{Cloud189Api, DRIVER_NAME};
pub use driver::Cloud189Driver;
