//! Command implementations and dispatch logic.
//!
//! Every command loads configuration through the same [`CommandContext`], so
//! file discovery, environment overrides and validation behave identically
//! for `serve`, `check` and `resolve`.

use std::collections::HashMap;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use depot_config::{ConfigLayering, ConfigLoader, ConfigSource, DepotConfig};
use depot_core::error::{DepotError, DepotResult};
use tracing::info;

pub mod check;
pub mod resolve;
pub mod serve;


use crate::{output::OutputHandler, Commands};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub config_path: Option<Utf8PathBuf>,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Create a context rooted at the current directory
    pub fn new(config_path: Option<PathBuf>) -> DepotResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| DepotError::io("Failed to get current directory".to_string(), e))?;

        Ok(Self {
            cwd: utf8(cwd, "cwd")?,
            config_path: config_path.map(|p| utf8(p, "config")).transpose()?,
            output: OutputHandler::new(),
        })
    }

    /// Load configuration with environment and `cli_overrides` applied
    pub async fn load_config(
        &self,
        cli_overrides: HashMap<String, String>,
    ) -> DepotResult<(DepotConfig, ConfigSource)> {
        let loader = match &self.config_path {
            Some(path) => ConfigLoader::with_path(self.cwd.clone(), path.clone()),
            None => ConfigLoader::new(self.cwd.clone()),
        };

        let (file_config, source) = loader.load_file().await?;
        let config = ConfigLayering::merge_configs(
            file_config,
            ConfigLayering::collect_env_overrides(),
            cli_overrides,
        )?;

        info!("Loaded configuration from {}", source.path());
        Ok((config, source))
    }
}

fn utf8(path: PathBuf, field: &str) -> DepotResult<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|path| DepotError::ConfigValidation {
        field: field.to_string(),
        reason: format!("{} is not valid UTF-8", path.display()),
    })
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> DepotResult<()> {
    match command {
        Commands::Serve { listen } => {
            info!("Starting proxy server");
            serve::execute(listen, ctx).await
        },
        Commands::Check => {
            info!("Checking configuration");
            check::execute(ctx).await
        },
        Commands::Resolve { name } => {
            info!("Resolving catalog: {}", name);
            resolve::execute(&name, ctx).await
        },
    }
}
