//! Catalog name resolution for the depot catalog proxy
//!
//! This crate turns the configured catalog table into an ordered list of
//! matchers and resolves a requested catalog name to the upstream it should
//! be fetched from, expanding `$1`..`$3` capture placeholders in the URI.

pub mod matcher;
pub mod table;

// Re-export main types
pub use matcher::CatalogMatcher;
pub use table::{CatalogDescriptor, CatalogTable, ResolvedCatalog};

use depot_core::error::DepotError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, DepotError>;
