//! depot.json configuration parsing
//!
//! Accepts the same shape as depot.toml, written as JSON:
//!
//! ```json
//! {
//!     "host": "depot.example.com",
//!     "cache_root": "/var/lib/depot/cache",
//!     "catalogs": {
//!         "stable": {
//!             "uri": "https://upstream.example.com/stable.json",
//!             "headers": { "x-pio.catalog-key": "s3cret" }
//!         }
//!     }
//! }
//! ```

use depot_core::error::DepotError;

use crate::toml::DepotConfig;
use crate::ConfigResult;

/// Parse JSON string to DepotConfig without validating it
pub fn parse_depot_json(content: &str) -> ConfigResult<DepotConfig> {
    serde_json::from_str(content).map_err(|e| DepotError::ConfigParse {
        message: format!("JSON parsing error at line {}, column {}: {}", e.line(), e.column(), e),
    })
}

/// Load and parse depot.json from file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<DepotConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DepotError::io(format!("Failed to read {}", path), e))?;

    parse_depot_json(&content).map_err(|e| match e {
        DepotError::ConfigParse { message } => DepotError::ConfigParse {
            message: format!("In file {}: {}", path, message),
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_legacy_layout() {
        let json = r#"{
            "host": "depot.example.com",
            "cache_root": "/var/lib/depot/cache",
            "catalogs": {
                "zeta": { "uri": "https://u/zeta.json", "headers": { "x-pio.catalog-key": "z" } },
                "alpha": { "uri": "https://u/alpha.json" }
            }
        }"#;

        let config = parse_depot_json(json).unwrap();
        let keys: Vec<_> = config.catalogs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(config.catalogs["zeta"].credential(), Some("z"));
        assert_eq!(config.catalogs["alpha"].credential(), None);
    }

    #[test]
    fn test_parse_error_reports_location() {
        let err = parse_depot_json("{\n  \"host\": }").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
