//! NotionRemoteStore - IRemoteStore implementation for the Notion API
//!
//! Wraps the [`NotionClient`] and maps the three remote-store operations onto
//! Notion endpoints:
//!
//! | Operation | Endpoint |
//! |---|---|
//! | `retrieve_schema` | `GET /databases/{id}` |
//! | `create_record` | `POST /pages` with a `database_id` parent |
//! | `update_record` | `PATCH /pages/{id}` |

use refsync_core::domain::{PropertyPayload, RemoteRecordId, RemoteSchema, UpsertOutcome};
use refsync_core::ports::{IRemoteStore, RemoteStoreError};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};

use crate::client::NotionClient;
use crate::properties::{encode_payload, DatabaseResponse, PageResponse};

/// Remote store backed by a Notion database
pub struct NotionRemoteStore {
    client: NotionClient,
}

impl NotionRemoteStore {
    /// Creates a new store wrapping the given [`NotionClient`]
    pub fn new(client: NotionClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client
    pub fn client(&self) -> &NotionClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl IRemoteStore for NotionRemoteStore {
    async fn retrieve_schema(&self, database_id: &str) -> Result<RemoteSchema, RemoteStoreError> {
        let path = format!("/databases/{database_id}");
        let response: DatabaseResponse = self.client.get_json(&path).await?;
        let schema = response.into_schema();
        info!(database_id, fields = schema.len(), "Retrieved database schema");
        Ok(schema)
    }

    async fn create_record(
        &self,
        parent_id: &str,
        payload: &PropertyPayload,
    ) -> Result<UpsertOutcome, RemoteStoreError> {
        let body = json!({
            "parent": { "database_id": parent_id },
            "properties": encode_payload(payload),
        });

        let page: PageResponse = self.client.send_json(Method::POST, "/pages", &body).await?;
        let outcome = page.into_outcome()?;
        debug!(parent_id, page_id = %outcome.id, "Created page");
        Ok(outcome)
    }

    async fn update_record(
        &self,
        record_id: &RemoteRecordId,
        payload: &PropertyPayload,
    ) -> Result<UpsertOutcome, RemoteStoreError> {
        let path = format!("/pages/{}", record_id.as_str());
        let body = json!({ "properties": encode_payload(payload) });

        let page: PageResponse = self.client.send_json(Method::PATCH, &path, &body).await?;
        let outcome = page.into_outcome()?;
        debug!(page_id = %outcome.id, "Updated page");
        Ok(outcome)
    }
}
