//! # depot-cli
//!
//! Caching proxy for upstream package catalogs.
//!
//! This is the main entry point for the `depot` binary. It parses the command
//! line, sets up logging and dispatches to the command handlers; `serve` runs
//! the HTTP proxy.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info};

mod commands;
mod output;
mod server;

use commands::CommandContext;

/// Caching proxy for upstream package catalogs
#[derive(Parser)]
#[command(name = "depot", version, about = "Caching catalog proxy")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to depot.toml or depot.json in a parent directory)
    #[arg(short, long, global = true, env = "DEPOT_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the proxy server
    Serve {
        /// Address to bind, overriding the configuration
        #[arg(long)]
        listen: Option<String>,
    },
    /// Load and validate configuration
    Check,
    /// Show which upstream a catalog name maps to
    Resolve {
        name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.log_format);
    setup_panic_handler();

    info!("Starting depot v{}", env!("CARGO_PKG_VERSION"));

    run_cli(cli)
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
    let ctx = CommandContext::new(cli.config).context("Failed to set up command context")?;

    let outcome = rt.block_on(commands::dispatch_command(cli.command, &ctx));
    if let Err(e) = outcome {
        ctx.output.report(&e);
        std::process::exit(1);
    }
    Ok(())
}

fn setup_logging(verbose: bool, format: LogFormat) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "depot={level},depot_registry={level},depot_cache={level},depot_resolver={level},tower_http={level}"
        ))
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("depot encountered an unexpected error: {}", panic_info);
        eprintln!("depot crashed! This is a bug.");
        eprintln!("Error: {}", panic_info);
    }));
}
