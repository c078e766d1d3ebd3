//! Fixed-delay retry around the cache fetch primitive

use std::sync::Arc;
use std::time::Duration;

use depot_cache::{CacheFetch, CachedFile, FetchTask};
use depot_config::RetrySection;
use depot_core::error::DepotError;
use tracing::{info, warn};

use crate::limiter::AdmissionLimiter;
use crate::RegistryResult;

/// Configuration for fixed-delay retry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay between consecutive attempts
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(3),
        }
    }
}

impl From<&RetrySection> for RetryConfig {
    fn from(section: &RetrySection) -> Self {
        Self {
            max_attempts: section.max_attempts.max(1),
            delay: section.delay(),
        }
    }
}

/// Runs fetch tasks through the limiter, retrying failures
#[derive(Clone)]
pub struct RetryingFetcher {
    cache: Arc<dyn CacheFetch>,
    limiter: AdmissionLimiter,
    retry: RetryConfig,
}

impl RetryingFetcher {
    /// Create a fetcher over `cache` sharing `limiter`
    pub fn new(cache: Arc<dyn CacheFetch>, limiter: AdmissionLimiter, retry: RetryConfig) -> Self {
        Self {
            cache,
            limiter,
            retry,
        }
    }

    /// Fetch `task`, retrying until success or attempts run out.
    ///
    /// Each attempt takes its own limiter slot and gives it back before the
    /// backoff sleep. Every error is retried the same way, including ones
    /// that look permanent such as an upstream 404.
    pub async fn fetch(&self, task: &FetchTask) -> RegistryResult<CachedFile> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            let outcome = {
                let _slot = self.limiter.acquire().await?;
                self.cache.fetch(task).await
            };

            match outcome {
                Ok(cached) => {
                    if attempt > 1 {
                        info!("Fetched {} on attempt {}/{}", task.url, attempt, max_attempts);
                    }
                    return Ok(cached);
                },
                Err(error) => {
                    warn!(
                        "Fetch attempt {}/{} for {} failed: {}",
                        attempt, max_attempts, task.url, error
                    );
                    last_error = Some(error);

                    if attempt < max_attempts {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                },
            }
        }

        Err(DepotError::UpstreamFetchFailed {
            url: task.url.clone(),
            attempts: max_attempts,
            source: Box::new(last_error.unwrap_or_else(|| DepotError::Network {
                message: "Retry loop ended without an attempt".to_string(),
                source: None,
            })),
        })
    }

    /// Limiter shared by every attempt
    pub fn limiter(&self) -> &AdmissionLimiter {
        &self.limiter
    }

    /// Active retry policy
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }
}
