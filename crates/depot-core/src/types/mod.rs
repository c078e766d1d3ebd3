//! Core data types for depot.
//!
//! This module provides the catalog document model: a named, versioned
//! index of packages whose aspects point at downloadable artifacts.

pub mod catalog;

// Re-export all public types
pub use catalog::{AspectRef, CatalogDocument, Package};
