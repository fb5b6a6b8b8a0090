//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits the sync engine depends on, whose
//! implementations live in adapter crates or in the host application.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStore`] - Remote workspace database (schema retrieval, record create/update)
//! - [`IRecordAccessor`] - Read-only access to source catalog items
//! - [`IResultSink`] - Receives sync outcomes so the host can persist remote references

pub mod record_accessor;
pub mod remote_store;
pub mod result_sink;

pub use record_accessor::{CitationFormat, IRecordAccessor};
pub use remote_store::{IRemoteStore, RemoteStoreError};
pub use result_sink::{BatchFailure, IResultSink};
