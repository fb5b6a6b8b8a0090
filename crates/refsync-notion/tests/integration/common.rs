//! Shared test helpers for Notion API integration tests
//!
//! Provides a wiremock-based mock server and helpers that mount the
//! database and page endpoints refsync uses.

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use refsync_notion::{NotionClient, NotionRemoteStore};

pub const DATABASE_ID: &str = "d9824bdc84454327be8b5b47500af6ce";

/// Starts a mock server and returns a store pointing at it
pub async fn setup_notion_mock() -> (MockServer, NotionRemoteStore) {
    let server = MockServer::start().await;
    let client = NotionClient::with_base_url("secret_test_token", server.uri());
    (server, NotionRemoteStore::new(client))
}

/// Builds a page object as returned by the pages endpoints
pub fn page_json(server: &MockServer, id: &str) -> serde_json::Value {
    serde_json::json!({
        "object": "page",
        "id": id,
        "url": format!("{}/{}", server.uri(), id),
        "properties": {}
    })
}

/// Builds a Notion error body
pub fn error_json(status: u16, code: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "object": "error",
        "status": status,
        "code": code,
        "message": message
    })
}

/// Mounts `GET /databases/{id}` returning the given properties object
pub async fn mount_database(server: &MockServer, properties: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/databases/{DATABASE_ID}")))
        .and(header("Notion-Version", "2022-06-28"))
        .and(header("authorization", "Bearer secret_test_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "object": "database",
            "id": DATABASE_ID,
            "properties": properties
        })))
        .mount(server)
        .await;
}
