//! Remote store port (driven/secondary port)
//!
//! Interface to the schema-typed workspace database that records are
//! mirrored into. The primary implementation targets the Notion API, but
//! the engine only relies on the three operations below.
//!
//! ## Design Notes
//!
//! - Unlike the catalog-facing ports, this port returns a classified
//!   [`RemoteStoreError`]: the upsert client must tell "object not found"
//!   apart from every other failure.
//! - Implementations must not retry internally; rate-limit responses are
//!   surfaced as [`RemoteStoreError::RateLimited`].

use std::time::Duration;

use thiserror::Error;

use crate::domain::newtypes::RemoteRecordId;
use crate::domain::property::{PropertyPayload, RemoteSchema};
use crate::domain::record::UpsertOutcome;

/// Errors surfaced by a remote store implementation
#[derive(Debug, Error)]
pub enum RemoteStoreError {
    /// The addressed record (or database) does not exist or is not shared
    /// with the integration
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The access credential was rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The service is throttling requests
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Server-provided back-off hint, if any
        retry_after: Option<Duration>,
    },

    /// Any other error response from the service
    #[error("API error ({status}) {code}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Service-specific error code
        code: String,
        /// Service-provided description
        message: String,
    },

    /// The request did not complete (connection, TLS, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response could not be parsed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteStoreError {
    /// Returns true for the "object not found" condition the upsert client
    /// recovers from by creating a new record
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteStoreError::NotFound(_))
    }
}

/// Port trait for the remote workspace database
#[async_trait::async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Retrieves the field definitions of the target database
    ///
    /// # Arguments
    /// * `database_id` - Identifier of the target database
    async fn retrieve_schema(&self, database_id: &str) -> Result<RemoteSchema, RemoteStoreError>;

    /// Creates a new record in the target database
    ///
    /// # Arguments
    /// * `parent_id` - Identifier of the database the record is created in
    /// * `payload` - Field values, already filtered against the schema
    async fn create_record(
        &self,
        parent_id: &str,
        payload: &PropertyPayload,
    ) -> Result<UpsertOutcome, RemoteStoreError>;

    /// Updates the fields of an existing record
    ///
    /// Returns [`RemoteStoreError::NotFound`] when the record no longer exists.
    async fn update_record(
        &self,
        record_id: &RemoteRecordId,
        payload: &PropertyPayload,
    ) -> Result<UpsertOutcome, RemoteStoreError>;
}
