//! Configuration layering, file discovery, and environment overrides

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use depot_core::error::DepotError;
use tracing::debug;

use crate::toml::{validate_config, DepotConfig};
use crate::ConfigResult;

/// File names searched when no explicit config path is given
const CONFIG_FILE_NAMES: [&str; 2] = ["depot.toml", "depot.json"];

/// Legacy variable holding the service data directory; the cache lives
/// in its `cache/` subdirectory.
const DATA_BASE_PATH_VAR: &str = "PIO_SERVICE_DATA_BASE_PATH";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Directory searched when no explicit path is given
    cwd: Utf8PathBuf,
    /// Explicit configuration file
    explicit: Option<Utf8PathBuf>,
}

/// Configuration layering and merging
pub struct ConfigLayering;

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// depot.toml style file
    Toml(Utf8PathBuf),
    /// depot.json style file
    Json(Utf8PathBuf),
}

impl ConfigSource {
    /// Path of the file the configuration came from
    pub fn path(&self) -> &Utf8Path {
        match self {
            ConfigSource::Toml(path) | ConfigSource::Json(path) => path,
        }
    }
}

impl ConfigLoader {
    /// Create a loader that searches `cwd` and its parents
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self {
            cwd,
            explicit: None,
        }
    }

    /// Create a loader for one explicit file
    pub fn with_path(cwd: Utf8PathBuf, path: Utf8PathBuf) -> Self {
        Self {
            cwd,
            explicit: Some(path),
        }
    }

    /// Load the configuration file without overrides or validation
    pub async fn load_file(&self) -> ConfigResult<(DepotConfig, ConfigSource)> {
        let path = match &self.explicit {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.cwd.join(path),
            None => self.find_config_file()?,
        };

        debug!("Loading configuration from {}", path);

        if path.extension() == Some("json") {
            let config = crate::json::load_from_file(&path).await?;
            Ok((config, ConfigSource::Json(path)))
        } else {
            let config = crate::toml::load_from_file(&path).await?;
            Ok((config, ConfigSource::Toml(path)))
        }
    }

    /// Load the file, apply process environment overrides, and validate
    pub async fn load(&self) -> ConfigResult<(DepotConfig, ConfigSource)> {
        let (config, source) = self.load_file().await?;
        let merged = ConfigLayering::merge_configs(
            config,
            ConfigLayering::collect_env_overrides(),
            HashMap::new(),
        )?;
        Ok((merged, source))
    }

    /// Find a configuration file (walks up the directory tree)
    pub fn find_config_file(&self) -> ConfigResult<Utf8PathBuf> {
        let mut current = self.cwd.as_path();

        loop {
            for name in CONFIG_FILE_NAMES {
                let candidate = current.join(name);
                if candidate.exists() {
                    return Ok(candidate);
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(DepotError::ConfigValidation {
            field: "config".to_string(),
            reason: format!(
                "No depot.toml or depot.json found in {} or its parent directories",
                self.cwd
            ),
        })
    }
}

impl ConfigLayering {
    /// Apply environment then CLI overrides and validate the result
    pub fn merge_configs(
        file_config: DepotConfig,
        env_overrides: HashMap<String, String>,
        cli_overrides: HashMap<String, String>,
    ) -> ConfigResult<DepotConfig> {
        let mut merged = file_config;

        Self::apply_env_overrides(&mut merged, &env_overrides)?;
        Self::apply_cli_overrides(&mut merged, &cli_overrides)?;

        validate_config(&merged)?;
        Ok(merged)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(
        config: &mut DepotConfig,
        overrides: &HashMap<String, String>,
    ) -> ConfigResult<()> {
        if let Some(base) = overrides.get(DATA_BASE_PATH_VAR) {
            if !overrides.contains_key("DEPOT_CACHE_ROOT") {
                config.cache_root = Utf8PathBuf::from(base).join("cache");
            }
        }

        for (key, value) in overrides {
            match key.as_str() {
                "DEPOT_HOST" => config.host = value.clone(),
                "DEPOT_LISTEN" => config.listen = value.clone(),
                "DEPOT_CACHE_ROOT" => config.cache_root = Utf8PathBuf::from(value),
                "DEPOT_MAX_CONCURRENT_FETCHES" => {
                    config.max_concurrent_fetches =
                        value.parse().map_err(|e| DepotError::ConfigValidation {
                            field: key.clone(),
                            reason: format!("'{}' is not a number: {}", value, e),
                        })?;
                },
                _ => {
                    // Unknown environment variable, ignore
                },
            }
        }

        Ok(())
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(
        config: &mut DepotConfig,
        overrides: &HashMap<String, String>,
    ) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "listen" => config.listen = value.clone(),
                "host" => config.host = value.clone(),
                "cache_root" => config.cache_root = Utf8PathBuf::from(value),
                _ => {
                    // Unknown CLI override, ignore
                },
            }
        }

        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with("DEPOT_") || key == DATA_BASE_PATH_VAR)
            .collect()
    }
}
