//! # Drive Core
//!
//! Provider-independent machinery shared by every storage driver.
//!
//! ## Overview
//!
//! - [`models`]: the Common File Model and the [`NativeEntry`] mapping
//! - [`response`]: the Response-Error Contract and the bounded refresh wrapper
//! - [`pager`]: drains paginated listing endpoints
//! - [`cache`] and [`resolver`]: per-account directory cache and path resolution
//! - [`listing`]: ordering, folder placement, the password marker and paging
//! - [`driver`] and [`registry`]: the driver contract and its write-once registry
//!
//! ## Control flow
//!
//! A driver receives `(account, path)`, the [`PathResolver`] consults the
//! [`DirectoryCache`], and on a miss the [`Pager`] walks the provider's
//! listing with refresh-on-expiry. Native records are normalized into
//! [`File`]s on the way out.

pub mod cache;
pub mod driver;
pub mod error;
pub mod listing;
pub mod models;
pub mod pager;
pub mod path;
pub mod registry;
pub mod resolver;
pub mod response;

pub use cache::DirectoryCache;
pub use driver::{
    common_items, Driver, DriverAuthenticator, DriverConfig, DriverContext, DriverDeps, FormItem,
    FormKind, ProxyHeaders,
};
pub use error::{DriveError, Result};
pub use listing::{
    extract_folders, paginate, password_gate, sort_files, FolderPlacement, SortDirection,
    SortField, SortOrder,
};
pub use models::{
    deserialize_id, normalize, normalize_all, File, FileCategory, FileType, NativeEntry,
    FOLDER_SIZE,
};
pub use pager::{Page, PageCursor, PageSource, Pager};
pub use registry::{DriverFactory, DriverRegistry, DriverRegistryBuilder};
pub use resolver::{PathResolver, Resolved};
pub use response::{check, with_refresh, ApiResponse};
