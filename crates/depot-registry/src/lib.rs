//! Upstream fetch orchestration for depot
//!
//! This crate bounds how many upstream fetches run at once, retries failed
//! fetches with a fixed backoff, fans catalog assets out into concurrent
//! fetches joined into one result, and ties these together into the
//! catalog request pipeline.

pub mod limiter;
pub mod retry;
pub mod assets;
pub mod service;

// Re-export main types
pub use limiter::{AdmissionLimiter, AdmissionSlot};
pub use retry::{RetryConfig, RetryingFetcher};
pub use assets::AssetJoin;
pub use service::CatalogService;

use depot_core::error::DepotError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, DepotError>;
