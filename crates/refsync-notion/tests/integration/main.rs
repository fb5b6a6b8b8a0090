//! Integration tests for refsync-notion
//!
//! Uses wiremock to simulate the Notion API and verifies end-to-end
//! behavior of schema retrieval, page creation, page updates and
//! error classification.

mod common;

mod test_pages;
mod test_schema;
