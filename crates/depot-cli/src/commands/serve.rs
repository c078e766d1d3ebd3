//! `depot serve`: run the proxy until interrupted

use std::collections::HashMap;
use std::sync::Arc;

use depot_cache::{ProxyCacheConfig, UrlProxyCache};
use depot_config::DepotConfig;
use depot_core::error::{DepotError, DepotResult};
use depot_registry::CatalogService;
use depot_resolver::CatalogTable;
use tokio::signal;
use tracing::{info, warn};

use super::CommandContext;
use crate::server::{create_router, AppState};

pub async fn execute(listen: Option<String>, ctx: &CommandContext) -> DepotResult<()> {
    let mut cli_overrides = HashMap::new();
    if let Some(listen) = listen {
        cli_overrides.insert("listen".to_string(), listen);
    }

    let (config, _) = ctx.load_config(cli_overrides).await?;
    let state = build_state(&config)?;
    if state.table.is_empty() {
        warn!("No catalogs configured");
    }

    let app = create_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .map_err(|e| DepotError::io(format!("Failed to bind {}", config.listen), e))?;

    info!(
        "Listening on {} (public host {}, cache {})",
        config.listen, config.host, config.cache_root
    );
    ctx.output.success(&format!("depot listening on {}", config.listen));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DepotError::io("HTTP server error".to_string(), e))?;

    info!("Server stopped");
    Ok(())
}

/// Wire the catalog table and fetch pipeline for `config`
pub fn build_state(config: &DepotConfig) -> DepotResult<AppState> {
    let table = CatalogTable::from_config(&config.catalogs)?;
    let cache = UrlProxyCache::new(ProxyCacheConfig {
        owner: config.owner.map(|owner| (owner.user, owner.group)),
        ..ProxyCacheConfig::default()
    })?;
    let service = CatalogService::from_config(config, Arc::new(cache));

    Ok(AppState::new(table, service))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
