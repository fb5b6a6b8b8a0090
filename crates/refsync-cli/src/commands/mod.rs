//! CLI command implementations
//!
//! Every command receives a [`CommandContext`] carrying the resolved
//! configuration and global flags. Commands that talk to the remote database
//! build their adapters through [`CommandContext::connect`].

pub mod config;
pub mod schema;
pub mod sync;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use refsync_core::config::{Config, EngineSettings};
use refsync_notion::{NotionClient, NotionRemoteStore};
use refsync_sync::{EngineDeps, SyncEngine};
use tracing::debug;

use crate::library::JsonLibrary;
use crate::output::OutputFormat;

/// State shared by all commands
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Configuration after environment overrides
    pub config: Config,
    pub config_path: PathBuf,
    /// Library file given on the command line, if any
    pub library_path: Option<PathBuf>,
    pub format: OutputFormat,
}

/// Adapters wired for a command run
pub struct Connection {
    pub engine: SyncEngine,
    pub library: Arc<JsonLibrary>,
}

impl CommandContext {
    /// Library file to use: the `--library` flag or the default data path
    pub fn library_path(&self) -> PathBuf {
        self.library_path
            .clone()
            .unwrap_or_else(JsonLibrary::default_path)
    }

    /// Resolves engine settings, failing on missing credentials
    pub fn engine_settings(&self) -> Result<EngineSettings> {
        EngineSettings::from_config(&self.config).with_context(|| {
            format!(
                "Invalid configuration (file: {})",
                self.config_path.display()
            )
        })
    }

    /// Opens the library and builds an engine over the Notion adapter
    pub async fn connect(&self) -> Result<Connection> {
        let settings = self.engine_settings()?;

        let library_path = self.library_path();
        let library = Arc::new(
            JsonLibrary::open(
                &library_path,
                self.config.sync.synced_tag.clone(),
                self.config.sync.attach_link,
            )
            .await?,
        );

        let client = NotionClient::with_base_url(&settings.api_token, &settings.base_url)
            .with_api_version(&settings.api_version);
        debug!(base_url = %client.base_url(), api_version = %client.api_version(), "Built Notion client");

        let deps = EngineDeps {
            remote: Arc::new(NotionRemoteStore::new(client)),
            accessor: library.clone(),
            sink: library.clone(),
        };

        Ok(Connection {
            engine: SyncEngine::new(settings, deps),
            library,
        })
    }
}
