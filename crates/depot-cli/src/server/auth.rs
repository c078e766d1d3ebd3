//! Shared-secret check run before any catalog fetch

use depot_core::error::{DepotError, DepotResult};
use depot_resolver::ResolvedCatalog;
use tracing::warn;

/// Check a request's `x-pio.catalog-key` against the resolved catalog.
///
/// Checks run in a fixed order so each rejection is distinct: header
/// present, catalog configured, catalog has a secret, catalog has an
/// upstream URI, secret matches.
pub fn authorize(
    presented: Option<&str>,
    name: &str,
    resolved: Option<ResolvedCatalog>,
) -> DepotResult<ResolvedCatalog> {
    let Some(presented) = presented.filter(|key| !key.is_empty()) else {
        warn!("Catalog '{}' requested without a key", name);
        return Err(DepotError::AuthMissingCredential);
    };

    let Some(resolved) = resolved else {
        warn!("Catalog '{}' is not configured", name);
        return Err(DepotError::CatalogNotFound {
            name: name.to_string(),
        });
    };

    let Some(expected) = resolved.credential.as_deref() else {
        warn!("Catalog '{}' has no key configured", name);
        return Err(DepotError::CatalogMisconfiguredCredential {
            name: name.to_string(),
        });
    };

    if resolved.uri.is_none() {
        warn!("Catalog '{}' has no uri configured", name);
        return Err(DepotError::CatalogMisconfiguredUri {
            name: name.to_string(),
        });
    }

    if presented != expected {
        warn!("Catalog '{}' requested with the wrong key", name);
        return Err(DepotError::CredentialMismatch {
            name: name.to_string(),
        });
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn catalog(credential: Option<&str>, uri: Option<&str>) -> ResolvedCatalog {
        ResolvedCatalog {
            name: "stable".to_string(),
            key: "stable".to_string(),
            uri: uri.map(str::to_string),
            credential: credential.map(str::to_string),
            headers: IndexMap::new(),
        }
    }

    #[test]
    fn test_accepts_matching_key() {
        let resolved = catalog(Some("s3cret"), Some("https://up/c.json"));
        let ok = authorize(Some("s3cret"), "stable", Some(resolved.clone())).unwrap();
        assert_eq!(ok, resolved);
    }

    #[test]
    fn test_missing_header_checked_first() {
        let err = authorize(None, "stable", None).unwrap_err();
        assert!(matches!(err, DepotError::AuthMissingCredential));

        let err = authorize(Some(""), "stable", None).unwrap_err();
        assert!(matches!(err, DepotError::AuthMissingCredential));
    }

    #[test]
    fn test_unknown_catalog() {
        let err = authorize(Some("k"), "nightly", None).unwrap_err();
        assert!(matches!(err, DepotError::CatalogNotFound { ref name } if name == "nightly"));
    }

    #[test]
    fn test_credential_checked_before_uri() {
        let err = authorize(Some("k"), "stable", Some(catalog(None, None))).unwrap_err();
        assert!(matches!(err, DepotError::CatalogMisconfiguredCredential { .. }));

        let err = authorize(Some("k"), "stable", Some(catalog(Some("k"), None))).unwrap_err();
        assert!(matches!(err, DepotError::CatalogMisconfiguredUri { .. }));
    }

    #[test]
    fn test_uri_checked_before_mismatch() {
        let err = authorize(Some("wrong"), "stable", Some(catalog(Some("k"), None))).unwrap_err();
        assert!(matches!(err, DepotError::CatalogMisconfiguredUri { .. }));

        let err = authorize(Some("wrong"), "stable", Some(catalog(Some("k"), Some("https://up"))))
            .unwrap_err();
        assert!(matches!(err, DepotError::CredentialMismatch { .. }));
    }
}
