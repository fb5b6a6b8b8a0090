//! Upsert client - idempotent create-or-update of one remote record
//!
//! With a stored remote id the record is updated in place. If the remote
//! reports that record as gone, a fresh record is created instead; every
//! other failure is returned unchanged. Without a stored id the record is
//! created directly.

use std::sync::Arc;

use refsync_core::domain::{PropertyPayload, RemoteRecordRef, UpsertOutcome};
use refsync_core::ports::{IRemoteStore, RemoteStoreError};
use tracing::{debug, warn};

/// Performs one update-or-create call per item
pub struct UpsertClient {
    store: Arc<dyn IRemoteStore>,
    database_id: String,
}

impl UpsertClient {
    /// Creates a client that creates new records under `database_id`
    pub fn new(store: Arc<dyn IRemoteStore>, database_id: impl Into<String>) -> Self {
        Self {
            store,
            database_id: database_id.into(),
        }
    }

    /// Updates the referenced record, or creates one
    ///
    /// # Errors
    /// Any [`RemoteStoreError`] other than "not found" on the update path,
    /// or any error from the create call.
    #[tracing::instrument(skip(self, payload), fields(field_count = payload.len()))]
    pub async fn upsert(
        &self,
        remote: &RemoteRecordRef,
        payload: &PropertyPayload,
    ) -> Result<UpsertOutcome, RemoteStoreError> {
        if let Some(record_id) = &remote.id {
            match self.store.update_record(record_id, payload).await {
                Ok(outcome) => {
                    debug!(remote_id = %outcome.id, "Updated remote record");
                    return Ok(outcome);
                }
                Err(err) if err.is_not_found() => {
                    warn!(
                        remote_id = %record_id,
                        "Remote record no longer exists, creating a new one"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        let outcome = self.store.create_record(&self.database_id, payload).await?;
        debug!(remote_id = %outcome.id, "Created remote record");
        Ok(outcome)
    }
}
