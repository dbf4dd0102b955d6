//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the drive crates:
//! - Logging and tracing setup
//! - Configuration management
//! - Event bus
//!
//! ## Overview
//!
//! Nothing in here knows about providers. Higher crates pull the configured
//! bridges out of [`config::CoreConfig`] and publish account and cache
//! notifications through [`events::EventBus`].

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
