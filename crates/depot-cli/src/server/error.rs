//! Mapping of depot errors onto HTTP responses.
//!
//! Every rejection becomes a non-2xx status with a one-line plain-text body;
//! cause chains are logged, never sent to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use depot_core::error::DepotError;
use tracing::error;

/// Error returned by request handlers
#[derive(Debug)]
pub struct AppError(pub DepotError);

impl From<DepotError> for AppError {
    fn from(error: DepotError) -> Self {
        Self(error)
    }
}

/// HTTP status for a depot error
pub fn status_for(error: &DepotError) -> StatusCode {
    match error {
        DepotError::AuthMissingCredential => StatusCode::BAD_REQUEST,
        DepotError::CatalogNotFound { .. } => StatusCode::NOT_FOUND,
        DepotError::CatalogMisconfiguredCredential { .. }
        | DepotError::CatalogMisconfiguredUri { .. }
        | DepotError::CredentialMismatch { .. }
        | DepotError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
        DepotError::UpstreamFetchFailed { .. }
        | DepotError::AssetFetchFailed { .. }
        | DepotError::MalformedCatalogDocument { .. }
        | DepotError::InvalidUrl { .. }
        | DepotError::Network { .. } => StatusCode::BAD_GATEWAY,
        DepotError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
            StatusCode::NOT_FOUND
        },
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = match status {
            StatusCode::NOT_FOUND if !matches!(self.0, DepotError::CatalogNotFound { .. }) => {
                "not found".to_string()
            },
            StatusCode::INTERNAL_SERVER_ERROR => "internal error".to_string(),
            _ => self.0.to_string(),
        };

        if status.is_server_error() {
            error!("{}: {:?}", status, self.0);
        }

        (status, body).into_response()
    }
}
