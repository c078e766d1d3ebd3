//! Error types and result aliases for depot operations.
//!
//! Provides a unified error type covering every rejection the proxy can
//! surface to a client, plus the ambient configuration and I/O failures.

use thiserror::Error;

/// Unified error type for all depot operations
#[derive(Error, Debug)]
pub enum DepotError {
    // Auth gate errors
    #[error("no auth code in request")]
    AuthMissingCredential,

    #[error("Catalog '{name}' not configured")]
    CatalogNotFound { name: String },

    #[error("'headers[x-pio.catalog-key]' not configured for catalog '{name}'")]
    CatalogMisconfiguredCredential { name: String },

    #[error("'uri' not configured for catalog '{name}'")]
    CatalogMisconfiguredUri { name: String },

    #[error("x-pio.catalog-key mismatch")]
    CredentialMismatch { name: String },

    // Fetch errors
    #[error("Upstream fetch of {url} failed after {attempts} attempts")]
    UpstreamFetchFailed {
        url: String,
        attempts: u32,
        #[source]
        source: Box<DepotError>,
    },

    #[error("Malformed catalog document at {path}: {reason}")]
    MalformedCatalogDocument { path: String, reason: String },

    #[error("Asset '{aspect}' of package '{package}' could not be fetched from {url}")]
    AssetFetchFailed {
        package: String,
        aspect: String,
        url: String,
        #[source]
        source: Box<DepotError>,
    },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // Config errors
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    #[error("Catalog pattern '{pattern}' is not a valid regular expression: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // Transport errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Permission denied: {permission} access to {resource}")]
    PermissionDenied {
        permission: String,
        resource: String,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for depot operations
pub type DepotResult<T> = Result<T, DepotError>;

impl DepotError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DepotError::Network { .. } | DepotError::Io { .. })
    }

    /// Check if this error was raised by the auth gate
    pub fn is_auth_rejection(&self) -> bool {
        matches!(
            self,
            DepotError::AuthMissingCredential
                | DepotError::CatalogNotFound { .. }
                | DepotError::CatalogMisconfiguredCredential { .. }
                | DepotError::CatalogMisconfiguredUri { .. }
                | DepotError::CredentialMismatch { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            DepotError::CatalogNotFound { .. } => {
                Some("Add the catalog under [catalogs] or check the requested name")
            },
            DepotError::CatalogMisconfiguredCredential { .. } => {
                Some("Set headers.\"x-pio.catalog-key\" for the catalog")
            },
            DepotError::CatalogMisconfiguredUri { .. } => Some("Set 'uri' for the catalog"),
            DepotError::InvalidPattern { .. } => {
                Some("Pattern keys are written as /regex/ and must compile as a Rust regex")
            },
            DepotError::Network { .. } | DepotError::UpstreamFetchFailed { .. } => {
                Some("Check that the upstream catalog source is reachable")
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_mismatch_message_is_short() {
        let err = DepotError::CredentialMismatch {
            name: "foo".to_string(),
        };
        assert_eq!(err.to_string(), "x-pio.catalog-key mismatch");
        assert!(err.is_auth_rejection());
    }

    #[test]
    fn test_upstream_failure_keeps_last_error() {
        let err = DepotError::UpstreamFetchFailed {
            url: "https://example.com/catalog.json".to_string(),
            attempts: 5,
            source: Box::new(DepotError::Network {
                message: "status 503".to_string(),
                source: None,
            }),
        };

        assert!(err.to_string().contains("after 5 attempts"));
        let source = err.source().expect("source error");
        assert_eq!(source.to_string(), "Network error: status 503");
        assert!(!err.is_auth_rejection());
    }

    #[test]
    fn test_recoverable() {
        let io = DepotError::io(
            "read failed".to_string(),
            std::io::Error::new(std::io::ErrorKind::Other, "boom"),
        );
        assert!(io.is_recoverable());
        assert!(!DepotError::AuthMissingCredential.is_recoverable());
    }

    #[test]
    fn test_suggestions() {
        let err = DepotError::CatalogNotFound {
            name: "foo".to_string(),
        };
        assert!(err.suggestion().is_some());
        assert!(DepotError::AuthMissingCredential.suggestion().is_none());
    }
}
