//! Catalog asset fan-out and join
//!
//! Every aspect URL in a catalog is fetched by its own task. The join waits
//! for all of them to finish before deciding the outcome, so a failing aspect
//! never leaves siblings running unobserved, and the document is only
//! rewritten once every aspect is cached. A failed join returns no document.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use depot_cache::FetchTask;
use depot_core::error::DepotError;
use depot_core::types::{AspectRef, CatalogDocument};
use depot_core::utils::{asset_cache_path, asset_public_url, url_basename};
use tracing::{debug, info, warn};

use crate::retry::RetryingFetcher;
use crate::RegistryResult;

/// Fetches a catalog's assets and points them at the proxy
#[derive(Clone)]
pub struct AssetJoin {
    fetcher: Arc<RetryingFetcher>,
    /// Public host used in rewritten URLs
    host: String,
    /// Freshness window for cached assets
    ttl: Option<Duration>,
}

impl AssetJoin {
    /// Create a join that rewrites asset URLs to `http://<host>/catalog/...`
    pub fn new(fetcher: Arc<RetryingFetcher>, host: impl Into<String>, ttl: Option<Duration>) -> Self {
        Self {
            fetcher,
            host: host.into(),
            ttl,
        }
    }

    /// Cache every aspect of `document` and return it with local URLs.
    ///
    /// `document_path` is where the catalog itself is cached; assets land in
    /// the sibling `~assets` directory.
    pub async fn ensure_assets(
        &self,
        document_path: &Path,
        catalog_name: &str,
        mut document: CatalogDocument,
    ) -> RegistryResult<CatalogDocument> {
        let aspects = document.aspects();
        info!(
            "Downloading {} catalog assets for catalog: {} ({} / {} / {})",
            aspects.len(),
            document_path.display(),
            document.name,
            document.uuid,
            document.revision
        );

        let handles: Vec<_> = aspects
            .iter()
            .cloned()
            .map(|aspect| {
                let fetcher = Arc::clone(&self.fetcher);
                let document_path = document_path.to_path_buf();
                let ttl = self.ttl;
                // Detached: a dropped request does not cancel its fetches
                tokio::spawn(async move { fetch_aspect(&fetcher, &document_path, ttl, aspect).await })
            })
            .collect();

        let mut basenames = Vec::with_capacity(handles.len());
        let mut first_error = None;

        for handle in handles {
            let outcome = handle.await.unwrap_or_else(|e| {
                Err(DepotError::network("Asset fetch task failed".to_string(), e))
            });

            match outcome {
                Ok(basename) => basenames.push(Some(basename)),
                Err(error) => {
                    basenames.push(None);
                    if first_error.is_none() {
                        first_error = Some(error);
                    } else {
                        debug!("Discarding additional asset failure: {}", error);
                    }
                },
            }
        }

        if let Some(error) = first_error {
            warn!("Catalog '{}' assets incomplete: {}", catalog_name, error);
            return Err(error);
        }

        for (aspect, basename) in aspects.iter().zip(basenames) {
            if let Some(basename) = basename {
                let local = asset_public_url(&self.host, catalog_name, &basename);
                document.set_aspect_url(&aspect.package, &aspect.aspect, local);
            }
        }

        Ok(document)
    }
}

/// Fetch one aspect, returning the basename it was cached under
async fn fetch_aspect(
    fetcher: &RetryingFetcher,
    document_path: &Path,
    ttl: Option<Duration>,
    aspect: AspectRef,
) -> RegistryResult<String> {
    let result = async {
        let basename = url_basename(&aspect.url)?;
        let task = FetchTask::new(aspect.url.clone(), asset_cache_path(document_path, &basename))
            .with_ttl(ttl);
        fetcher.fetch(&task).await?;
        Ok::<_, DepotError>(basename)
    }
    .await;

    result.map_err(|source| DepotError::AssetFetchFailed {
        package: aspect.package,
        aspect: aspect.aspect,
        url: aspect.url,
        source: Box::new(source),
    })
}

#[cfg(test)]
mod tests;
