//! Utility functions and helpers.
//!
//! Common functionality used across multiple depot crates.

pub mod path;

// Re-export commonly used utilities
pub use path::{
    asset_cache_path, asset_public_url, is_safe_path, normalize_path, safe_join,
    strip_revision_token, url_basename,
};
