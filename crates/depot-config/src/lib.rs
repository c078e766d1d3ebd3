//! Configuration parsing for the depot catalog proxy
//!
//! This crate handles parsing and validation of `depot.toml` and `depot.json`
//! files and layers environment overrides on top, producing one immutable
//! `DepotConfig` for the whole process.

pub mod toml;
pub mod json;
pub mod merge;

// Re-export main types
pub use crate::toml::{CatalogSection, DepotConfig, OwnerSection, RetrySection};
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource};

use depot_core::error::DepotError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, DepotError>;
