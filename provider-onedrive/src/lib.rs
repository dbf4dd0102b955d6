//! # OneDrive Provider
//!
//! Microsoft Graph drives: personal and business OneDrive plus SharePoint
//! document libraries, in the global, China, US government and Germany
//! clouds.
//!
//! ## Overview
//!
//! - Refresh-token grants against the zone's login host; rotated refresh
//!   tokens are persisted
//! - The mount root is addressed by path, everything below by item id
//! - Listings follow `@odata.nextLink` until exhausted
//! - Links are fetched fresh because listed download URLs expire

pub mod api;
pub mod driver;
pub mod host;
pub mod types;

pub use api::{OneDriveApi, DRIVER_NAME};
pub use driver::OneDriveDriver;
