//! TTL-based URL proxy cache for depot
//!
//! This crate provides the fetch primitive the proxy is built on: download
//! a URL to a fixed path on disk unless a fresh copy is already there, and
//! fall back to an existing copy when the upstream is unavailable.

pub mod proxy;
pub mod task;

// Re-export main types
pub use proxy::{ProxyCacheConfig, UrlProxyCache};
pub use task::{CachedFile, FetchTask};

use async_trait::async_trait;
use depot_core::error::DepotError;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, DepotError>;

/// A single fetch-if-stale operation against the on-disk cache
#[async_trait]
pub trait CacheFetch: Send + Sync {
    /// Ensure `task.url` is cached at `task.cache_path`
    async fn fetch(&self, task: &FetchTask) -> CacheResult<CachedFile>;
}
