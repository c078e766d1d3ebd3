//! HTTP surface of the proxy.
//!
//! Requests are authorized against the catalog table before any upstream
//! fetch starts; all fetching goes through the shared [`CatalogService`].

use std::path::Path;
use std::sync::Arc;

use axum::routing::{any, get};
use axum::Router;
use depot_registry::CatalogService;
use depot_resolver::CatalogTable;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error;
pub mod handlers;


/// State shared by every request
pub struct AppState {
    pub table: CatalogTable,
    pub service: Arc<CatalogService>,
}

impl AppState {
    pub fn new(table: CatalogTable, service: CatalogService) -> Self {
        Self {
            table,
            service: Arc::new(service),
        }
    }

    /// Root of the on-disk cache assets are served from
    pub fn cache_root(&self) -> &Path {
        self.service.cache_root()
    }
}

/// Build the router with all routes and request tracing
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/catalog/{name}", get(handlers::catalog))
        .route("/catalog/{dir}/{file}", get(handlers::asset))
        .route("/http/{*rest}", any(handlers::passthrough))
        .route("/https/{*rest}", any(handlers::passthrough))
        .route("/healthz", get(handlers::healthz))
        .fallback(handlers::fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
