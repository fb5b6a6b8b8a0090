//! refsync Notion - Notion API adapter
//!
//! Provides an async client for the subset of the Notion REST API refsync
//! needs:
//! - Database retrieval (schema introspection)
//! - Page creation inside a database
//! - Page property updates
//!
//! ## Modules
//!
//! - [`client`] - Authenticated HTTP client and error-response mapping
//! - [`properties`] - Wire encoding of property payloads and schema decoding
//! - [`store`] - [`IRemoteStore`](refsync_core::ports::IRemoteStore) implementation

pub mod client;
pub mod properties;
pub mod store;

pub use client::NotionClient;
pub use store::NotionRemoteStore;
