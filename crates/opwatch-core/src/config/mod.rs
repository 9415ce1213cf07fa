//! Configuration and profile management for opwatch
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! Profiles name an API endpoint and the token used to reach it. The file is
//! read-only from opwatch's point of view; tokens are managed elsewhere.
//!
//! # Features
//!
//! - Multiple named profiles with a default
//! - Environment variable expansion in config files
//! - Platform-specific config file locations

pub mod config;
pub mod error;

// Re-export main types for convenience
pub use config::{Config, Profile};
pub use error::{ConfigError, Result};
