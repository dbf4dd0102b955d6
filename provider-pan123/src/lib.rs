//! # 123Pan Provider
//!
//! Driver for the 123Pan web API.
//!
//! - Login: JSON `user/sign_in` with passport and password, bearer token
//! - Listing: `file/list`, 100 entries per page, `Next` cursor until `-1`
//! - Expired session: response `code` 401
//! - Links: `file/download_info`, then one non-following request to pick up
//!   the CDN redirect
//! - Proxy: the `Origin` header is stripped

pub mod api;
pub mod driver;
pub mod types;

pub use api::{Pan123Api, DRIVER_NAME};
pub use driver::Pan123Driver;
