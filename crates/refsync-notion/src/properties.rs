//! Wire encoding for Notion property values
//!
//! Converts the engine's typed [`PropertyPayload`] into the JSON shape the
//! Notion pages endpoints expect, and decodes database and page responses
//! back into domain types.

use std::collections::HashMap;

use refsync_core::domain::{PropertyKind, PropertyPayload, PropertyValue, RemoteSchema, UpsertOutcome};
use refsync_core::ports::RemoteStoreError;
use serde::Deserialize;
use serde_json::{json, Map, Value};

// ============================================================================
// Response types
// ============================================================================

/// Response from `GET /databases/{id}`; only the property definitions matter
#[derive(Debug, Deserialize)]
pub(crate) struct DatabaseResponse {
    #[serde(default)]
    properties: HashMap<String, PropertyDefinition>,
}

/// A single property definition inside a database response
#[derive(Debug, Deserialize)]
struct PropertyDefinition {
    #[serde(rename = "type")]
    kind: PropertyKind,
}

impl DatabaseResponse {
    pub(crate) fn into_schema(self) -> RemoteSchema {
        self.properties
            .into_iter()
            .map(|(name, def)| (name, def.kind))
            .collect()
    }
}

/// Page object returned by `POST /pages` and `PATCH /pages/{id}`
#[derive(Debug, Deserialize)]
pub(crate) struct PageResponse {
    id: String,
    #[serde(default)]
    url: String,
}

impl PageResponse {
    pub(crate) fn into_outcome(self) -> Result<UpsertOutcome, RemoteStoreError> {
        let id = self
            .id
            .parse()
            .map_err(|e| RemoteStoreError::InvalidResponse(format!("Bad page id: {e}")))?;
        Ok(UpsertOutcome { id, url: self.url })
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes a text value as a rich-text array; empty text is an empty array
fn text_array(content: &str) -> Value {
    if content.is_empty() {
        return json!([]);
    }
    json!([{ "type": "text", "text": { "content": content } }])
}

/// Encodes a single property value
pub fn encode_value(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Title(text) => json!({ "title": text_array(text) }),
        PropertyValue::RichText(text) => json!({ "rich_text": text_array(text) }),
        PropertyValue::Number(number) => json!({ "number": number }),
        PropertyValue::Url(url) => {
            let url = url.as_deref().filter(|u| !u.is_empty());
            json!({ "url": url })
        }
        PropertyValue::MultiSelect(options) => {
            let options: Vec<Value> = options.iter().map(|name| json!({ "name": name })).collect();
            json!({ "multi_select": options })
        }
    }
}

/// Encodes a whole payload as the `properties` object of a page request
pub fn encode_payload(payload: &PropertyPayload) -> Value {
    let properties: Map<String, Value> = payload
        .iter()
        .map(|(name, value)| (name.to_string(), encode_value(value)))
        .collect();
    Value::Object(properties)
}
