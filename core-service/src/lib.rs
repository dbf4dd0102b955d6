//! Drive service facade and bootstrap helpers.
//!
//! This crate wires the host bridges from [`CoreConfig`] into the account
//! registry, the auth manager and the provider drivers, and exposes the
//! public (list, stat, link, preview, proxy headers) and admin (schemas,
//! accounts, settings) operations. Desktop hosts enable the `desktop-shims`
//! feature, which bundles every provider and the SQLite stores.

pub mod error;
pub mod mount;
pub mod service;
pub mod settings;

#[cfg(feature = "desktop-shims")]
pub mod drivers;

pub use error::{Result, ServiceError};
pub use mount::Mount;
pub use service::{DriveService, DriverSchema, ListOptions, Listing};

pub use core_runtime::config::CoreConfig;

#[cfg(feature = "desktop-shims")]
pub use drivers::builtin_drivers;

/// Builds a service over the SQLite database at `database_path` with every
/// bundled provider, seeds missing settings and logs all accounts in.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// let service = core_service::bootstrap_desktop("data/data.db").await?;
/// let root = service.list("/", Default::default()).await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(
    database_path: impl Into<std::path::PathBuf>,
) -> Result<DriveService> {
    let config = CoreConfig::builder()
        .database_path(database_path)
        .build()
        .await
        .map_err(|err| ServiceError::InitializationFailed(err.to_string()))?;
    let service = DriveService::new(config, builtin_drivers()).await?;
    service.seed_settings().await?;

    for (name, outcome) in service.refresh_all().await {
        if let Err(err) = outcome {
            tracing::warn!(account = %name, error = %err, "Account login failed at startup");
        }
    }
    Ok(service)
}
