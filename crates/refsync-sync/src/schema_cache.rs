//! Remote schema cache
//!
//! The remote database's field definitions are fetched once and reused for
//! the rest of the process. Concurrent callers during the first fetch share
//! a single request; a failed fetch is not cached, so the next caller retries.

use std::sync::Arc;

use refsync_core::domain::RemoteSchema;
use refsync_core::ports::{IRemoteStore, RemoteStoreError};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Memoized [`RemoteSchema`] for one target database
pub struct RemoteSchemaCache {
    store: Arc<dyn IRemoteStore>,
    database_id: String,
    schema: OnceCell<Arc<RemoteSchema>>,
}

impl RemoteSchemaCache {
    /// Creates an empty cache for the given database
    pub fn new(store: Arc<dyn IRemoteStore>, database_id: impl Into<String>) -> Self {
        Self {
            store,
            database_id: database_id.into(),
            schema: OnceCell::new(),
        }
    }

    /// Returns the schema, fetching it on first use
    pub async fn get_schema(&self) -> Result<Arc<RemoteSchema>, RemoteStoreError> {
        let schema = self
            .schema
            .get_or_try_init(|| async {
                debug!(database_id = %self.database_id, "Fetching remote schema");
                let schema = self.store.retrieve_schema(&self.database_id).await?;
                info!(
                    database_id = %self.database_id,
                    fields = schema.len(),
                    "Remote schema cached"
                );
                Ok::<_, RemoteStoreError>(Arc::new(schema))
            })
            .await?;

        Ok(Arc::clone(schema))
    }

    /// Returns true once a schema has been fetched successfully
    pub fn is_loaded(&self) -> bool {
        self.schema.initialized()
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }
}
