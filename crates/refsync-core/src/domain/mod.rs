//! Domain entities
//!
//! This module contains the core domain types for refsync:
//! - Newtypes for validated identifiers (catalog items, remote records)
//! - Source records as read from the reference catalog
//! - Remote schema and typed property payloads
//! - Domain-specific error types

pub mod errors;
pub mod newtypes;
pub mod property;
pub mod record;

// Re-export commonly used types
pub use errors::{ConfigError, DomainError};
pub use newtypes::{ItemId, RemoteRecordId};
pub use property::{PropertyKind, PropertyPayload, PropertyValue, RemoteSchema};
pub use record::{Creator, CreatorRole, RemoteRecordRef, SourceRecord, UpsertOutcome};
