//! Integration tests for database schema retrieval

use refsync_core::domain::PropertyKind;
use refsync_core::ports::{IRemoteStore, RemoteStoreError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{self, DATABASE_ID};

#[tokio::test]
async fn test_retrieve_schema_maps_property_types() {
    let (server, store) = common::setup_notion_mock().await;

    common::mount_database(
        &server,
        serde_json::json!({
            "Name": {"id": "title", "name": "Name", "type": "title", "title": {}},
            "Title": {"id": "t1", "name": "Title", "type": "rich_text", "rich_text": {}},
            "Tags": {"id": "t2", "name": "Tags", "type": "multi_select", "multi_select": {"options": []}},
            "URL": {"id": "t3", "name": "URL", "type": "url", "url": {}},
            "Year": {"id": "t4", "name": "Year", "type": "number", "number": {}},
            "Created": {"id": "t5", "name": "Created", "type": "created_time", "created_time": {}}
        }),
    )
    .await;

    let schema = store
        .retrieve_schema(DATABASE_ID)
        .await
        .expect("schema retrieval failed");

    assert_eq!(schema.len(), 6);
    assert!(schema.has_field("Name", PropertyKind::Title));
    assert!(schema.has_field("Title", PropertyKind::RichText));
    assert!(schema.has_field("Tags", PropertyKind::MultiSelect));
    assert!(schema.has_field("URL", PropertyKind::Url));
    assert!(schema.has_field("Year", PropertyKind::Number));
    assert_eq!(schema.kind_of("Created"), Some(PropertyKind::Unsupported));
}

#[tokio::test]
async fn test_retrieve_schema_unknown_database_is_not_found() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("GET"))
        .and(path("/databases/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(common::error_json(
            404,
            "object_not_found",
            "Could not find database with ID: missing.",
        )))
        .mount(&server)
        .await;

    let err = store.retrieve_schema("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_retrieve_schema_bad_token_is_unauthorized() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("GET"))
        .and(path(format!("/databases/{DATABASE_ID}")))
        .respond_with(ResponseTemplate::new(401).set_body_json(common::error_json(
            401,
            "unauthorized",
            "API token is invalid.",
        )))
        .mount(&server)
        .await;

    let err = store.retrieve_schema(DATABASE_ID).await.unwrap_err();
    assert!(matches!(err, RemoteStoreError::Unauthorized(_)));
}

#[tokio::test]
async fn test_retrieve_schema_malformed_body() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("GET"))
        .and(path(format!("/databases/{DATABASE_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = store.retrieve_schema(DATABASE_ID).await.unwrap_err();
    assert!(matches!(err, RemoteStoreError::InvalidResponse(_)));
}
