//! refsync Sync - Change-coalescing synchronization engine
//!
//! Turns a stream of item-changed notifications into serialized,
//! idempotent upserts against a schema-typed remote database.
//!
//! ## Modules
//!
//! - [`queue`] - Debounce queue that coalesces changed item ids into batches
//! - [`coordinator`] - Single-flight batch runner with post-run re-drain
//! - [`mapper`] - Schema-aware projection of catalog records into payloads
//! - [`schema_cache`] - Process-lifetime cache of the remote schema
//! - [`upsert`] - Update-or-create against the remote store
//! - [`notifier`] - Adapter between host change notifications and the queue
//! - [`engine`] - Construction and wiring of the above
//!
//! ## Flow
//!
//! ```text
//! notification ──→ ChangeNotifierAdapter ──→ DebounceQueue ──(timer, Idle)──→ SyncCoordinator
//!                                                                                   │
//!                                       PropertyMapper (RemoteSchemaCache) ──→ UpsertClient
//! ```

pub mod coordinator;
pub mod engine;
pub mod mapper;
pub mod notifier;
pub mod queue;
pub mod schema_cache;
pub mod upsert;

use refsync_core::domain::{ConfigError, ItemId};
use refsync_core::ports::RemoteStoreError;
use thiserror::Error;

pub use coordinator::{BatchReport, SyncCoordinator};
pub use engine::{EngineDeps, SyncEngine};
pub use mapper::{FieldSource, FieldSpec, PropertyMapper};
pub use notifier::{ChangeKind, ChangeNotification, ChangeNotifierAdapter};
pub use queue::{ChangeSet, DebounceQueue, RunState};
pub use schema_cache::RemoteSchemaCache;
pub use upsert::UpsertClient;

/// Errors that can occur while synchronizing a single item
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote store rejected or failed a request
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteStoreError),

    /// A field value could not be produced for the payload
    #[error("Failed to map field '{field}': {message}")]
    Mapping {
        /// Remote field being produced
        field: String,
        /// Underlying failure, with its full cause chain
        message: String,
    },

    /// The catalog failed to load the item
    #[error("Failed to resolve item {item}: {message}")]
    Resolve {
        /// Item that could not be loaded
        item: ItemId,
        /// Underlying failure, with its full cause chain
        message: String,
    },

    /// Engine construction failed on missing or invalid settings
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
