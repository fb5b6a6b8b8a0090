//! refsync Core - Domain types, configuration and port definitions
//!
//! This crate is the hexagonal core of refsync:
//! - **Domain types** - `ItemId`, `SourceRecord`, `RemoteRecordRef`, `RemoteSchema`,
//!   `PropertyPayload`, `UpsertOutcome`
//! - **Port definitions** - Traits for adapters: `IRemoteStore`, `IRecordAccessor`,
//!   `IResultSink`
//! - **Configuration** - YAML-backed settings and the validated `EngineSettings`
//!
//! # Architecture
//!
//! The domain module contains plain data and validation with no I/O.
//! Ports define the trait interfaces the sync engine depends on; the
//! catalog host and the remote workspace API are adapters that implement them.

pub mod config;
pub mod domain;
pub mod ports;
