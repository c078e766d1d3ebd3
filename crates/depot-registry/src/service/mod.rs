//! Catalog request pipeline
//!
//! Fetches a resolved catalog document into the cache, parses it, caches
//! every asset it references and hands back the rewritten document.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use depot_cache::{CacheFetch, FetchTask};
use depot_config::DepotConfig;
use depot_core::error::DepotError;
use depot_core::types::CatalogDocument;
use depot_core::{ASSETS_SUFFIX, CATALOG_KEY_HEADER};
use depot_resolver::ResolvedCatalog;
use tracing::{debug, info};

use crate::assets::AssetJoin;
use crate::limiter::AdmissionLimiter;
use crate::retry::{RetryConfig, RetryingFetcher};
use crate::RegistryResult;

/// Shared state for serving catalogs
pub struct CatalogService {
    fetcher: Arc<RetryingFetcher>,
    assets: AssetJoin,
    cache_root: PathBuf,
    catalog_ttl: Option<Duration>,
}

impl CatalogService {
    /// Build the pipeline described by `config` on top of `cache`
    pub fn from_config(config: &DepotConfig, cache: Arc<dyn CacheFetch>) -> Self {
        let limiter = AdmissionLimiter::new(config.max_concurrent_fetches);
        let fetcher = Arc::new(RetryingFetcher::new(
            cache,
            limiter,
            RetryConfig::from(&config.retry),
        ));

        Self::new(
            fetcher,
            config.host.clone(),
            config.cache_root.as_std_path().to_path_buf(),
            config.catalog_ttl(),
            config.asset_ttl(),
        )
    }

    /// Build the pipeline from its parts
    pub fn new(
        fetcher: Arc<RetryingFetcher>,
        host: impl Into<String>,
        cache_root: impl Into<PathBuf>,
        catalog_ttl: Option<Duration>,
        asset_ttl: Option<Duration>,
    ) -> Self {
        let assets = AssetJoin::new(Arc::clone(&fetcher), host, asset_ttl);
        Self {
            fetcher,
            assets,
            cache_root: cache_root.into(),
            catalog_ttl,
        }
    }

    /// Fetch `resolved`, cache its assets and return the rewritten document.
    ///
    /// `inbound_headers` are forwarded upstream; headers configured for the
    /// catalog replace inbound ones of the same name.
    pub async fn fetch_catalog(
        &self,
        resolved: &ResolvedCatalog,
        inbound_headers: &[(String, String)],
    ) -> RegistryResult<CatalogDocument> {
        let uri = resolved
            .uri
            .as_deref()
            .ok_or_else(|| DepotError::CatalogMisconfiguredUri {
                name: resolved.name.clone(),
            })?;

        let document_path = self.document_path(&resolved.name)?;
        let task = FetchTask::new(uri, &document_path)
            .with_ttl(self.catalog_ttl)
            .with_headers(upstream_headers(resolved, inbound_headers));

        info!("Fetching catalog '{}' from {}", resolved.name, uri);
        let cached = self.fetcher.fetch(&task).await?;
        if cached.stale {
            info!("Serving stale copy of catalog '{}'", resolved.name);
        }

        let bytes = tokio::fs::read(&cached.cache_path).await.map_err(|e| {
            DepotError::io(format!("Failed to read {}", cached.cache_path.display()), e)
        })?;
        let document =
            CatalogDocument::from_slice(&bytes, &cached.cache_path.display().to_string())?;
        debug!(
            "Catalog '{}' lists {} aspects",
            resolved.name,
            document.aspect_count()
        );

        self.assets
            .ensure_assets(&document_path, &resolved.name, document)
            .await
    }

    /// Run [`fetch_catalog`](Self::fetch_catalog) on its own task.
    ///
    /// The pipeline runs to completion even if the caller stops waiting, so
    /// a client disconnect never leaves a half-populated asset directory.
    pub async fn fetch_catalog_detached(
        self: Arc<Self>,
        resolved: ResolvedCatalog,
        inbound_headers: Vec<(String, String)>,
    ) -> RegistryResult<CatalogDocument> {
        let handle = tokio::spawn(async move {
            self.fetch_catalog(&resolved, &inbound_headers).await
        });

        handle
            .await
            .unwrap_or_else(|e| Err(DepotError::network("Catalog task failed".to_string(), e)))
    }

    /// Where the document for `name` is cached.
    ///
    /// Names containing `~assets` would collide with an asset directory and
    /// are refused.
    pub fn document_path(&self, name: &str) -> RegistryResult<PathBuf> {
        let unsafe_name = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0'])
            || name.contains(ASSETS_SUFFIX);
        if unsafe_name {
            return Err(DepotError::PermissionDenied {
                permission: "catalog name".to_string(),
                resource: name.to_string(),
            });
        }

        Ok(self.cache_root.join("catalog").join(name))
    }

    /// Root directory of the on-disk cache
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Limiter shared by every upstream fetch
    pub fn limiter(&self) -> &AdmissionLimiter {
        self.fetcher.limiter()
    }
}

/// Inbound headers with catalog overrides applied; the client's secret is
/// never sent upstream
fn upstream_headers(
    resolved: &ResolvedCatalog,
    inbound_headers: &[(String, String)],
) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = inbound_headers
        .iter()
        .filter(|(name, _)| !name.eq_ignore_ascii_case(CATALOG_KEY_HEADER))
        .filter(|(name, _)| {
            !resolved
                .headers
                .keys()
                .any(|configured| configured.eq_ignore_ascii_case(name))
        })
        .cloned()
        .collect();

    headers.extend(
        resolved
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone())),
    );
    headers
}
