//! Workspace umbrella crate.
//!
//! Re-exports the drive service so hosts can depend on one crate and pick
//! the `desktop-shims` feature (bundled providers, reqwest transport,
//! SQLite stores) without wiring each workspace crate individually.

pub use core_service::*;
