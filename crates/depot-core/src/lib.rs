//! # depot-core
//!
//! Core types and utilities shared across all depot crates.
//!
//! This crate provides:
//! - `CatalogDocument` and `Package` types for upstream catalog indexes
//! - `DepotError` enum for unified error handling
//! - Path helpers for cache layout and safe file serving
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Catalog document types
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{DepotError, DepotResult};
pub use types::{AspectRef, CatalogDocument, Package};

/// Request header carrying the shared catalog secret.
pub const CATALOG_KEY_HEADER: &str = "x-pio.catalog-key";

/// Suffix marking the asset directory that sits beside a cached catalog.
pub const ASSETS_SUFFIX: &str = "~assets";
