//! Integration tests for page creation and updates

use std::time::Duration;

use refsync_core::domain::{PropertyPayload, PropertyValue, RemoteRecordId};
use refsync_core::ports::{IRemoteStore, RemoteStoreError};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{self, DATABASE_ID};

fn sample_payload() -> PropertyPayload {
    let mut payload = PropertyPayload::new();
    payload.insert("Name", PropertyValue::Title("(Turing, 1936)".into()));
    payload.insert("Tags", PropertyValue::MultiSelect(vec!["x;y".into()]));
    payload.insert("Year", PropertyValue::Number(Some(1936.0)));
    payload
}

#[tokio::test]
async fn test_create_record_posts_parent_and_properties() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("POST"))
        .and(path("/pages"))
        .and(body_json(serde_json::json!({
            "parent": {"database_id": DATABASE_ID},
            "properties": {
                "Name": {"title": [{"type": "text", "text": {"content": "(Turing, 1936)"}}]},
                "Tags": {"multi_select": [{"name": "x;y"}]},
                "Year": {"number": 1936.0}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::page_json(&server, "page-new-1")))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = store
        .create_record(DATABASE_ID, &sample_payload())
        .await
        .expect("create failed");

    assert_eq!(outcome.id.as_str(), "page-new-1");
    assert_eq!(outcome.url, format!("{}/page-new-1", server.uri()));
}

#[tokio::test]
async fn test_update_record_patches_properties_only() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("PATCH"))
        .and(path("/pages/page-r1"))
        .and(body_json(serde_json::json!({
            "properties": {
                "Name": {"title": [{"type": "text", "text": {"content": "(Turing, 1936)"}}]},
                "Tags": {"multi_select": [{"name": "x;y"}]},
                "Year": {"number": 1936.0}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::page_json(&server, "page-r1")))
        .expect(1)
        .mount(&server)
        .await;

    let record_id = RemoteRecordId::new("page-r1".to_string()).unwrap();
    let outcome = store
        .update_record(&record_id, &sample_payload())
        .await
        .expect("update failed");

    assert_eq!(outcome.id, record_id);
}

#[tokio::test]
async fn test_update_deleted_page_is_not_found() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("PATCH"))
        .and(path("/pages/page-gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(common::error_json(
            404,
            "object_not_found",
            "Could not find page with ID: page-gone.",
        )))
        .mount(&server)
        .await;

    let record_id = RemoteRecordId::new("page-gone".to_string()).unwrap();
    let err = store
        .update_record(&record_id, &sample_payload())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_rate_limited_is_not_retried() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("POST"))
        .and(path("/pages"))
        .respond_with(
            ResponseTemplate::new(429)
                .append_header("Retry-After", "2")
                .set_body_json(common::error_json(429, "rate_limited", "Too many requests")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = store
        .create_record(DATABASE_ID, &sample_payload())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RemoteStoreError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(2)
    ));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_server_error_is_api_error() {
    let (server, store) = common::setup_notion_mock().await;

    Mock::given(method("POST"))
        .and(path("/pages"))
        .respond_with(ResponseTemplate::new(503).set_body_json(common::error_json(
            503,
            "service_unavailable",
            "Notion is unavailable",
        )))
        .mount(&server)
        .await;

    let err = store
        .create_record(DATABASE_ID, &sample_payload())
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteStoreError::Api { status: 503, .. }));
}
