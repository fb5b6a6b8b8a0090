//! Sync engine - explicit construction and wiring
//!
//! The [`SyncEngine`] owns one instance of each component and is built from
//! validated [`EngineSettings`] plus the port implementations it consumes.
//! Nothing is global: hosts construct an engine, feed it notifications,
//! and shut it down.
//!
//! ```text
//! notify() ──→ ChangeNotifierAdapter ──→ DebounceQueue ──→ SyncCoordinator (worker task)
//! ```

use std::sync::Arc;

use refsync_core::config::{Config, EngineSettings};
use refsync_core::domain::{ItemId, RemoteSchema};
use refsync_core::ports::{IRecordAccessor, IRemoteStore, IResultSink};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::coordinator::{BatchReport, SyncCoordinator};
use crate::mapper::PropertyMapper;
use crate::notifier::{ChangeNotification, ChangeNotifierAdapter};
use crate::queue::DebounceQueue;
use crate::schema_cache::RemoteSchemaCache;
use crate::upsert::UpsertClient;
use crate::SyncError;

/// Port implementations the engine is built on
#[derive(Clone)]
pub struct EngineDeps {
    /// Remote workspace database
    pub remote: Arc<dyn IRemoteStore>,
    /// Source catalog
    pub accessor: Arc<dyn IRecordAccessor>,
    /// Receives sync outcomes
    pub sink: Arc<dyn IResultSink>,
}

/// Change-driven synchronizer for one remote database
pub struct SyncEngine {
    settings: EngineSettings,
    schema: Arc<RemoteSchemaCache>,
    queue: Arc<DebounceQueue>,
    coordinator: Arc<SyncCoordinator>,
    notifier: ChangeNotifierAdapter,
    batches: Option<mpsc::UnboundedReceiver<Vec<ItemId>>>,
    shutdown: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl SyncEngine {
    /// Wires the engine from resolved settings
    pub fn new(settings: EngineSettings, deps: EngineDeps) -> Self {
        let schema = Arc::new(RemoteSchemaCache::new(
            Arc::clone(&deps.remote),
            settings.database_id.clone(),
        ));
        let mapper = PropertyMapper::new(Arc::clone(&schema), Arc::clone(&deps.accessor));
        let upsert = UpsertClient::new(deps.remote, settings.database_id.clone());
        let coordinator = Arc::new(SyncCoordinator::new(
            deps.accessor,
            mapper,
            upsert,
            deps.sink,
            settings.requeue_on_abort,
        ));

        let (queue, batches) = DebounceQueue::new(settings.debounce);
        let notifier = ChangeNotifierAdapter::new(Arc::clone(&queue), settings.sync_on_modify);

        info!(
            database_id = %settings.database_id,
            sync_on_modify = settings.sync_on_modify,
            requeue_on_abort = settings.requeue_on_abort,
            "Sync engine created"
        );

        Self {
            settings,
            schema,
            queue,
            coordinator,
            notifier,
            batches: Some(batches),
            shutdown: CancellationToken::new(),
            worker: None,
        }
    }

    /// Builds the engine from a loaded configuration
    ///
    /// # Errors
    /// [`SyncError::Config`] if the access token or database id is missing,
    /// or another setting is invalid.
    pub fn from_config(config: &Config, deps: EngineDeps) -> Result<Self, SyncError> {
        let settings = EngineSettings::from_config(config)?;
        Ok(Self::new(settings, deps))
    }

    /// Spawns the coordinator worker; later calls are no-ops
    pub fn start(&mut self) {
        let Some(batches) = self.batches.take() else {
            warn!("Sync engine already started");
            return;
        };

        let coordinator = Arc::clone(&self.coordinator);
        let queue = Arc::clone(&self.queue);
        let shutdown = self.shutdown.clone();
        self.worker = Some(tokio::spawn(async move {
            coordinator.run_loop(queue, batches, shutdown).await;
        }));
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Forwards a host notification; see [`ChangeNotifierAdapter::handle`]
    pub fn notify(&self, notification: ChangeNotification) -> bool {
        self.notifier.handle(notification)
    }

    pub fn notifier(&self) -> &ChangeNotifierAdapter {
        &self.notifier
    }

    pub fn queue(&self) -> &Arc<DebounceQueue> {
        &self.queue
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Token cancelled on shutdown; hosts can tie their notification
    /// sources to it
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Returns the remote schema, fetching it on first use
    pub async fn schema(&self) -> Result<Arc<RemoteSchema>, SyncError> {
        Ok(self.schema.get_schema().await?)
    }

    /// Processes ids immediately, bypassing the debounce queue
    ///
    /// Intended for one-shot use on an engine that has not been started.
    pub async fn sync_now(&self, ids: &[ItemId]) -> BatchReport {
        if self.is_running() {
            warn!("sync_now called on a started engine; runs are not serialized with the queue");
        }
        self.coordinator.process_batch(ids).await
    }

    /// Waits until no batch is pending, armed or running
    pub async fn wait_settled(&self) {
        self.queue.wait_settled().await;
    }

    /// Stops the worker after any in-flight batch completes
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                warn!(error = %e, "Coordinator task ended abnormally");
            }
        }
        info!("Sync engine stopped");
    }
}
