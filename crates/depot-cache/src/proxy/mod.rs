//! URL proxy cache backed by reqwest and the local filesystem

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use depot_core::error::DepotError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::task::{CachedFile, FetchTask};
use crate::{CacheFetch, CacheResult};

/// Suffix counter for in-progress download files
static PART_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Configuration for the proxy cache HTTP client
#[derive(Debug, Clone)]
pub struct ProxyCacheConfig {
    /// Whole-request timeout
    pub timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Numeric (uid, gid) applied to every cached file
    pub owner: Option<(u32, u32)>,
    /// User agent sent upstream
    pub user_agent: String,
}

impl Default for ProxyCacheConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            owner: None,
            user_agent: format!("depot/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Fetch-if-stale cache that stores each URL at a caller-chosen path
#[derive(Debug, Clone)]
pub struct UrlProxyCache {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Ownership applied after each write
    owner: Option<(u32, u32)>,
}

impl UrlProxyCache {
    /// Create a proxy cache with connection pooling
    pub fn new(config: ProxyCacheConfig) -> CacheResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| DepotError::network("Failed to create HTTP client".to_string(), e))?;

        Ok(Self {
            client,
            owner: config.owner,
        })
    }

    /// Check whether a cached copy exists and is within its TTL
    async fn fresh_copy(&self, task: &FetchTask) -> Option<CachedFile> {
        let metadata = tokio::fs::metadata(&task.cache_path).await.ok()?;
        if !metadata.is_file() {
            return None;
        }

        let fresh = match task.ttl {
            None => true,
            Some(ttl) => metadata
                .modified()
                .ok()
                .and_then(|modified| modified.elapsed().ok())
                .map(|age| age < ttl)
                .unwrap_or(false),
        };

        fresh.then(|| CachedFile {
            cache_path: task.cache_path.clone(),
            from_cache: true,
            stale: false,
        })
    }

    /// Download `task.url` into `task.cache_path`
    async fn download(&self, task: &FetchTask) -> CacheResult<()> {
        let mut response = self
            .client
            .get(&task.url)
            .headers(build_headers(&task.headers))
            .send()
            .await
            .map_err(|e| DepotError::network(format!("Failed to fetch {}", task.url), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DepotError::Network {
                message: format!("{} returned status {}", task.url, status),
                source: None,
            });
        }

        if let Some(parent) = task.cache_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DepotError::io(format!("Failed to create {}", parent.display()), e)
            })?;
        }

        let part_path = part_path(&task.cache_path);
        let written = async {
            let mut file = tokio::fs::File::create(&part_path).await.map_err(|e| {
                DepotError::io(format!("Failed to create {}", part_path.display()), e)
            })?;

            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| DepotError::network(format!("Failed to read {}", task.url), e))?
            {
                file.write_all(&chunk).await.map_err(|e| {
                    DepotError::io(format!("Failed to write {}", part_path.display()), e)
                })?;
            }

            file.flush().await.map_err(|e| {
                DepotError::io(format!("Failed to flush {}", part_path.display()), e)
            })?;

            tokio::fs::rename(&part_path, &task.cache_path).await.map_err(|e| {
                DepotError::io(format!("Failed to move {} into place", part_path.display()), e)
            })
        }
        .await;

        if written.is_err() {
            let _ = tokio::fs::remove_file(&part_path).await;
        }
        written?;

        self.apply_owner(&task.cache_path);
        Ok(())
    }

    #[cfg(unix)]
    fn apply_owner(&self, path: &Path) {
        if let Some((user, group)) = self.owner {
            if let Err(e) = std::os::unix::fs::chown(path, Some(user), Some(group)) {
                warn!("Failed to chown {} to {}:{}: {}", path.display(), user, group, e);
            }
        }
    }

    #[cfg(not(unix))]
    fn apply_owner(&self, _path: &Path) {}
}

#[async_trait]
impl CacheFetch for UrlProxyCache {
    async fn fetch(&self, task: &FetchTask) -> CacheResult<CachedFile> {
        if let Some(cached) = self.fresh_copy(task).await {
            debug!("Cache hit for {} at {}", task.url, task.cache_path.display());
            return Ok(cached);
        }

        info!("Fetching {}", task.url);
        match self.download(task).await {
            Ok(()) => Ok(CachedFile {
                cache_path: task.cache_path.clone(),
                from_cache: false,
                stale: false,
            }),
            Err(error) => {
                if tokio::fs::metadata(&task.cache_path)
                    .await
                    .map(|m| m.is_file())
                    .unwrap_or(false)
                {
                    warn!(
                        "Using existing copy of {} after fetch error: {}",
                        task.url, error
                    );
                    return Ok(CachedFile {
                        cache_path: task.cache_path.clone(),
                        from_cache: true,
                        stale: true,
                    });
                }
                Err(error)
            },
        }
    }
}

/// Convert (name, value) pairs, skipping any that are not valid HTTP
fn build_headers(headers: &[(String, String)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.append(name, value);
            },
            _ => warn!("Dropping invalid header '{}'", name),
        }
    }
    map
}

/// Sibling path used while a download is in progress
fn part_path(target: &Path) -> PathBuf {
    let n = PART_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".part-{}-{}", std::process::id(), n));
    target.with_file_name(name)
}

#[cfg(test)]
mod tests;
