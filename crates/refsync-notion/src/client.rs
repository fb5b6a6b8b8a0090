//! Notion API client
//!
//! Provides a typed HTTP client for the Notion REST API. Handles
//! authentication and version headers, JSON (de)serialization, and maps
//! error responses onto [`RemoteStoreError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use refsync_notion::client::NotionClient;
//!
//! # async fn example() -> Result<(), refsync_core::ports::RemoteStoreError> {
//! let client = NotionClient::new("secret_token");
//! let database: serde_json::Value = client.get_json("/databases/d9824bdc84454327be8b5b47500af6ce").await?;
//! println!("{}", database["title"]);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use refsync_core::ports::RemoteStoreError;
use reqwest::{header::HeaderMap, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

/// Base URL for Notion API v1
const NOTION_BASE_URL: &str = "https://api.notion.com/v1";

/// API version pinned by this client
const NOTION_API_VERSION: &str = "2022-06-28";

/// Header carrying the API version
const VERSION_HEADER: &str = "Notion-Version";

/// Error code Notion returns for missing or unshared objects
const OBJECT_NOT_FOUND: &str = "object_not_found";

// ============================================================================
// Error response body
// ============================================================================

/// Error body returned by Notion for every non-2xx response
///
/// `{"object": "error", "status": 404, "code": "object_not_found", "message": "..."}`
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

// ============================================================================
// NotionClient
// ============================================================================

/// HTTP client for Notion API calls
///
/// Wraps `reqwest::Client` with the bearer token, the `Notion-Version`
/// header and base URL construction. It performs no retries; throttling
/// is reported as [`RemoteStoreError::RateLimited`].
#[derive(Debug, Clone)]
pub struct NotionClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests
    base_url: String,
    /// Integration access token
    access_token: String,
    /// Value of the `Notion-Version` header
    api_version: String,
}

impl NotionClient {
    /// Creates a new client against the public Notion API
    ///
    /// # Arguments
    /// * `access_token` - Integration secret
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, NOTION_BASE_URL)
    }

    /// Creates a new client with a custom base URL (useful for testing)
    ///
    /// # Arguments
    /// * `access_token` - Integration secret
    /// * `base_url` - Custom base URL for API requests
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: NOTION_API_VERSION.to_string(),
        }
    }

    /// Overrides the `Notion-Version` header value
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the configured API version
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - API path relative to base URL (e.g., "/pages")
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(&self.access_token)
            .header(VERSION_HEADER, &self.api_version)
    }

    /// Sends a GET request and parses the JSON response body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteStoreError> {
        debug!(path, "GET");
        self.send(self.request(Method::GET, path)).await
    }

    /// Sends a request with a JSON body and parses the JSON response body
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, RemoteStoreError> {
        debug!(%method, path, "Sending JSON request");
        self.send(self.request(method, path).json(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteStoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteStoreError::Transport(format!("{e}")))?;

        let response = check_status(response).await?;

        let text = response
            .text()
            .await
            .map_err(|e| RemoteStoreError::Transport(format!("Failed to read response body: {e}")))?;

        serde_json::from_str(&text)
            .map_err(|e| RemoteStoreError::InvalidResponse(format!("Failed to parse response: {e}")))
    }
}

/// Passes successful responses through and converts error responses
async fn check_status(response: Response) -> Result<Response, RemoteStoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = retry_after_header(response.headers());
    let body = response.text().await.unwrap_or_default();
    let err = error_from_response(status, retry_after, &body);
    warn!(status = status.as_u16(), error = %err, "Notion API returned an error");
    Err(err)
}

fn retry_after_header(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after)
}

/// Parses a `Retry-After` value given in whole seconds
pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Maps a non-2xx status and its body onto a [`RemoteStoreError`]
///
/// "Not found" is recognised both from the HTTP status and from the
/// `object_not_found` error code, since the code is the documented signal.
pub(crate) fn error_from_response(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> RemoteStoreError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = if parsed.message.is_empty() {
        body.trim().to_string()
    } else {
        parsed.message
    };

    if status == StatusCode::NOT_FOUND || parsed.code == OBJECT_NOT_FOUND {
        return RemoteStoreError::NotFound(message);
    }

    match status {
        StatusCode::UNAUTHORIZED => RemoteStoreError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => RemoteStoreError::RateLimited { retry_after },
        _ => RemoteStoreError::Api {
            status: status.as_u16(),
            code: parsed.code,
            message,
        },
    }
}
