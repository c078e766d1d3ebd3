//! depot.toml configuration parsing and serialization

use std::time::Duration;

use camino::Utf8PathBuf;
use depot_core::error::DepotError;
use depot_core::CATALOG_KEY_HEADER;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ConfigResult;

/// Complete depot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepotConfig {
    /// Public host (and port) used when rewriting asset URLs
    #[serde(default)]
    pub host: String,

    /// Address the HTTP server binds to
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Root directory of the on-disk cache
    #[serde(default)]
    pub cache_root: Utf8PathBuf,

    /// Upper bound on upstream fetches in flight across the process
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Freshness window for catalog documents, 0 means never re-check
    #[serde(default = "default_catalog_ttl_secs")]
    pub catalog_ttl_secs: u64,

    /// Freshness window for assets, 0 means never re-check
    #[serde(default)]
    pub asset_ttl_secs: u64,

    /// Retry policy for upstream fetches
    #[serde(default)]
    pub retry: RetrySection,

    /// Ownership applied to cached files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerSection>,

    /// Catalog definitions, evaluated in file order
    #[serde(default)]
    pub catalogs: IndexMap<String, CatalogSection>,
}

/// Retry policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySection {
    /// Total attempts including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

/// Numeric owner for cached files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSection {
    pub user: u32,
    pub group: u32,
}

/// One catalog definition.
///
/// The key is either a literal catalog name or a `/regex/` pattern whose
/// capture groups fill `$1`..`$3` in `uri`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogSection {
    /// Upstream catalog URI template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Request headers; `x-pio.catalog-key` holds the shared secret
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_concurrent_fetches() -> usize {
    6
}

fn default_catalog_ttl_secs() -> u64 {
    15
}

fn default_max_attempts() -> u32 {
    5
}

fn default_delay_secs() -> u64 {
    3
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_delay_secs(),
        }
    }
}

impl RetrySection {
    /// Delay between attempts
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

impl CatalogSection {
    /// Configured shared secret, if any
    pub fn credential(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(CATALOG_KEY_HEADER))
            .map(|(_, key)| key.as_str())
            .filter(|key| !key.is_empty())
    }
}

impl DepotConfig {
    /// Catalog document freshness window; `None` means cached forever
    pub fn catalog_ttl(&self) -> Option<Duration> {
        non_zero_secs(self.catalog_ttl_secs)
    }

    /// Asset freshness window; `None` means cached forever
    pub fn asset_ttl(&self) -> Option<Duration> {
        non_zero_secs(self.asset_ttl_secs)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Parse TOML string to DepotConfig without validating it
pub fn parse_depot_toml(content: &str) -> ConfigResult<DepotConfig> {
    toml::from_str(content).map_err(|e| DepotError::ConfigParse {
        message: format!("TOML parsing error: {}", e),
    })
}

/// Serialize DepotConfig to TOML string
pub fn serialize_depot_toml(config: &DepotConfig) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| DepotError::ConfigParse {
        message: format!("TOML serialization error: {}", e),
    })
}

/// Validate configuration completeness
pub fn validate_config(config: &DepotConfig) -> ConfigResult<()> {
    if config.host.trim().is_empty() {
        return Err(DepotError::ConfigValidation {
            field: "host".to_string(),
            reason: "public host is required to rewrite asset URLs".to_string(),
        });
    }

    if config.host.contains('/') {
        return Err(DepotError::ConfigValidation {
            field: "host".to_string(),
            reason: format!("'{}' must be a bare host[:port] without scheme or path", config.host),
        });
    }

    if config.cache_root.as_str().is_empty() {
        return Err(DepotError::ConfigValidation {
            field: "cache_root".to_string(),
            reason: "cache root directory is required".to_string(),
        });
    }

    if config.max_concurrent_fetches == 0 {
        return Err(DepotError::ConfigValidation {
            field: "max_concurrent_fetches".to_string(),
            reason: "must allow at least one fetch".to_string(),
        });
    }

    if config.retry.max_attempts == 0 {
        return Err(DepotError::ConfigValidation {
            field: "retry.max_attempts".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    for key in config.catalogs.keys() {
        if key.is_empty() {
            return Err(DepotError::ConfigValidation {
                field: "catalogs".to_string(),
                reason: "catalog keys must not be empty".to_string(),
            });
        }
    }

    Ok(())
}

/// Load and parse depot.toml from file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<DepotConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DepotError::io(format!("Failed to read {}", path), e))?;

    parse_depot_toml(&content).map_err(|e| match e {
        DepotError::ConfigParse { message } => DepotError::ConfigParse {
            message: format!("In file {}: {}", path, message),
        },
        other => other,
    })
}
