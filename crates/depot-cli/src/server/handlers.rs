//! Request handlers

use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use depot_core::error::DepotError;
use depot_core::utils::safe_join;
use depot_core::{ASSETS_SUFFIX, CATALOG_KEY_HEADER};
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};

use super::auth::authorize;
use super::error::AppError;
use super::AppState;

/// `GET /catalog/{name}`
#[instrument(skip(state, headers))]
pub async fn catalog(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let presented = headers
        .get(CATALOG_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    let resolved = authorize(presented, &name, state.table.resolve(&name))?;

    let inbound = headers
        .iter()
        .filter_map(|(key, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (key.as_str().to_string(), value.to_string()))
        })
        .collect();

    let document = Arc::clone(&state.service)
        .fetch_catalog_detached(resolved, inbound)
        .await?;
    let body = document.to_pretty_json()?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// `GET /catalog/{name}~assets[~token]/{file}`
#[instrument(skip_all)]
pub async fn asset(
    State(state): State<Arc<AppState>>,
    Path((dir, file)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let relative = asset_relative_path(&dir, &file).ok_or_else(|| not_found(&dir, &file))?;
    let path = safe_join(state.cache_root(), &relative)?;

    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|e| DepotError::io(format!("Failed to stat {}", path.display()), e))?;
    if !metadata.is_file() {
        return Err(not_found(&dir, &file).into());
    }

    let handle = tokio::fs::File::open(&path)
        .await
        .map_err(|e| DepotError::io(format!("Failed to open {}", path.display()), e))?;
    debug!("Serving {} ({} bytes)", path.display(), metadata.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, metadata.len().to_string()),
        ],
        Body::from_stream(ReaderStream::new(handle)),
    )
        .into_response())
}

/// Cache-relative path of an asset, if the request names one.
///
/// The directory must be `<name>~assets`, optionally followed by a
/// `~<token>` revision suffix which is ignored.
pub fn asset_relative_path(dir: &str, file: &str) -> Option<PathBuf> {
    let (name, rest) = dir.split_once(ASSETS_SUFFIX)?;
    if name.is_empty() || !(rest.is_empty() || rest.starts_with('~')) {
        return None;
    }

    let mut components = FsPath::new(file).components();
    let single_file = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
        && !file.contains(['/', '\\']);
    if !single_file {
        return None;
    }

    Some(
        PathBuf::from("catalog")
            .join(format!("{}{}", name, ASSETS_SUFFIX))
            .join(file),
    )
}

fn not_found(dir: &str, file: &str) -> DepotError {
    DepotError::io(
        format!("No asset {}/{}", dir, file),
        std::io::Error::from(std::io::ErrorKind::NotFound),
    )
}

/// `/http/*` and `/https/*`: the open proxy is disabled
pub async fn passthrough() -> impl IntoResponse {
    (StatusCode::FORBIDDEN, "passthrough proxying is disabled")
}

/// `GET /healthz`
pub async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let limiter = state.service.limiter();
    Json(json!({
        "status": "ok",
        "capacity": limiter.capacity(),
        "in_flight": limiter.in_flight(),
    }))
}

/// Anything unrouted, including `/catalog/` with an empty name
pub async fn fallback() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}
