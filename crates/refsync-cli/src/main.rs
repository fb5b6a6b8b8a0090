//! refsync CLI - Sync a reference catalog into a Notion database
//!
//! Provides commands for:
//! - Inspecting the target database schema
//! - One-shot syncing of selected or all library items
//! - Watching a change-notification stream and syncing debounced batches
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use refsync_core::config::Config;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod library;
mod output;

use commands::{
    config::ConfigCommand, schema::SchemaCommand, sync::SyncCommand, watch::WatchCommand,
    CommandContext,
};
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "refsync",
    version,
    about = "Sync reference catalog items into a Notion database"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Library file to read items from
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the properties of the target database
    Schema(SchemaCommand),
    /// Sync library items now
    Sync(SyncCommand),
    /// Sync debounced batches from notifications on stdin
    Watch(WatchCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Reads the config file if present, then applies environment overrides
fn load_config(path: &std::path::Path) -> Result<Config> {
    let mut config = if path.exists() {
        Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?
    } else {
        Config::default()
    };
    config.apply_env_overrides();
    Ok(config)
}

fn init_tracing(verbose: u8, configured_level: &str, json: bool) {
    let filter = match verbose {
        0 => configured_level,
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            get_formatter(format).error(&format!("{e:#}"));
            std::process::exit(1);
        }
    };

    init_tracing(cli.verbose, &config.logging.level, cli.json);
    debug!(config_path = %config_path.display(), "Loaded configuration");

    let ctx = CommandContext {
        config,
        config_path,
        library_path: cli.library,
        format,
    };

    let result = match &cli.command {
        Commands::Schema(cmd) => cmd.execute(&ctx).await,
        Commands::Sync(cmd) => cmd.execute(&ctx).await,
        Commands::Watch(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
    };

    if let Err(e) = result {
        get_formatter(format).error(&format!("{e:#}"));
        std::process::exit(1);
    }
    Ok(())
}
