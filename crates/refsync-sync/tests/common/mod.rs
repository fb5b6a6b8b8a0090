//! In-memory port implementations shared by the engine tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use refsync_core::config::EngineSettings;
use refsync_core::domain::{
    ItemId, PropertyKind, PropertyPayload, PropertyValue, RemoteRecordId, RemoteRecordRef,
    RemoteSchema, SourceRecord, UpsertOutcome,
};
use refsync_core::ports::{
    BatchFailure, CitationFormat, IRecordAccessor, IRemoteStore, IResultSink, RemoteStoreError,
};
use refsync_sync::EngineDeps;

pub const DATABASE_ID: &str = "db-1";

pub fn id(s: &str) -> ItemId {
    ItemId::new(s.to_string()).unwrap()
}

pub fn ids(list: &[&str]) -> Vec<ItemId> {
    list.iter().map(|s| id(s)).collect()
}

pub fn remote_id(s: &str) -> RemoteRecordId {
    RemoteRecordId::new(s.to_string()).unwrap()
}

pub fn settings(debounce_ms: u64) -> EngineSettings {
    EngineSettings {
        api_token: "secret_test".into(),
        database_id: DATABASE_ID.into(),
        base_url: "http://localhost".into(),
        api_version: "2022-06-28".into(),
        debounce: Duration::from_millis(debounce_ms),
        sync_on_modify: false,
        requeue_on_abort: false,
    }
}

/// Schema with every field of the default field set
pub fn full_schema() -> RemoteSchema {
    [
        ("Name", PropertyKind::Title),
        ("Title", PropertyKind::RichText),
        ("Authors", PropertyKind::RichText),
        ("Editors", PropertyKind::RichText),
        ("Abstract", PropertyKind::RichText),
        ("DOI", PropertyKind::RichText),
        ("URL", PropertyKind::Url),
        ("Year", PropertyKind::Number),
        ("Tags", PropertyKind::MultiSelect),
        ("Full Citation", PropertyKind::RichText),
        ("In-Text Citation", PropertyKind::RichText),
        ("File Path", PropertyKind::RichText),
    ]
    .into_iter()
    .collect()
}

// ============================================================================
// MockStore
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Create { title: String },
    Update { id: String, title: String },
}

/// Remote store recording every write
///
/// Records are identified in calls by their `Title` payload value.
pub struct MockStore {
    schema: RemoteSchema,
    schema_fetches: AtomicUsize,
    calls: Mutex<Vec<(StoreCall, Instant)>>,
    payloads: Mutex<Vec<PropertyPayload>>,
    missing: Mutex<HashSet<String>>,
    failing_titles: Mutex<HashSet<String>>,
    latency: Mutex<Duration>,
    next_id: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockStore {
    pub fn new(schema: RemoteSchema) -> Self {
        Self {
            schema,
            schema_fetches: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            payloads: Mutex::new(Vec::new()),
            missing: Mutex::new(HashSet::new()),
            failing_titles: Mutex::new(HashSet::new()),
            latency: Mutex::new(Duration::ZERO),
            next_id: AtomicUsize::new(2),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Updates of this remote id report "object not found"
    pub fn mark_missing(&self, remote_id: &str) {
        self.missing.lock().unwrap().insert(remote_id.to_string());
    }

    /// Writes of records with this title fail with a server error
    pub fn fail_title(&self, title: &str) {
        self.failing_titles.lock().unwrap().insert(title.to_string());
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(StoreCall, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn payloads(&self) -> Vec<PropertyPayload> {
        self.payloads.lock().unwrap().clone()
    }

    pub fn schema_fetches(&self) -> usize {
        self.schema_fetches.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn title_of(payload: &PropertyPayload) -> String {
        match payload.get("Title") {
            Some(PropertyValue::RichText(t)) => t.clone(),
            _ => String::new(),
        }
    }

    async fn write(&self, call: StoreCall, payload: &PropertyPayload) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push((call, Instant::now()));
        self.payloads.lock().unwrap().push(payload.clone());

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn check_failure(&self, title: &str) -> Result<(), RemoteStoreError> {
        if self.failing_titles.lock().unwrap().contains(title) {
            return Err(RemoteStoreError::Api {
                status: 502,
                code: "bad_gateway".into(),
                message: "upstream unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IRemoteStore for MockStore {
    async fn retrieve_schema(&self, database_id: &str) -> Result<RemoteSchema, RemoteStoreError> {
        assert_eq!(database_id, DATABASE_ID);
        self.schema_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.schema.clone())
    }

    async fn create_record(
        &self,
        parent_id: &str,
        payload: &PropertyPayload,
    ) -> Result<UpsertOutcome, RemoteStoreError> {
        assert_eq!(parent_id, DATABASE_ID);
        let title = Self::title_of(payload);
        self.write(StoreCall::Create { title: title.clone() }, payload).await;
        self.check_failure(&title)?;

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = format!("R{n}");
        Ok(UpsertOutcome {
            url: format!("https://www.notion.so/{id}"),
            id: remote_id(&id),
        })
    }

    async fn update_record(
        &self,
        record_id: &RemoteRecordId,
        payload: &PropertyPayload,
    ) -> Result<UpsertOutcome, RemoteStoreError> {
        let title = Self::title_of(payload);
        let call = StoreCall::Update {
            id: record_id.to_string(),
            title: title.clone(),
        };
        self.write(call, payload).await;

        if self.missing.lock().unwrap().contains(record_id.as_str()) {
            return Err(RemoteStoreError::NotFound(record_id.to_string()));
        }
        self.check_failure(&title)?;

        Ok(UpsertOutcome {
            id: record_id.clone(),
            url: format!("https://www.notion.so/{record_id}"),
        })
    }
}

// ============================================================================
// MockAccessor
// ============================================================================

/// In-memory catalog
#[derive(Default)]
pub struct MockAccessor {
    records: Mutex<HashMap<ItemId, SourceRecord>>,
    citations: Mutex<HashMap<(ItemId, CitationFormat), String>>,
    files: Mutex<HashMap<ItemId, PathBuf>>,
    broken_citations: Mutex<HashSet<ItemId>>,
}

impl MockAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record whose title is its id
    pub fn add(&self, item: &str) {
        self.insert(SourceRecord::new(id(item), item));
    }

    pub fn insert(&self, record: SourceRecord) {
        self.records.lock().unwrap().insert(record.id.clone(), record);
    }

    pub fn set_citation(&self, item: &str, format: CitationFormat, text: &str) {
        self.citations
            .lock()
            .unwrap()
            .insert((id(item), format), text.to_string());
    }

    pub fn set_file(&self, item: &str, path: &str) {
        self.files.lock().unwrap().insert(id(item), PathBuf::from(path));
    }

    pub fn break_citations(&self, item: &str) {
        self.broken_citations.lock().unwrap().insert(id(item));
    }

    pub fn set_remote(&self, item: &ItemId, remote: RemoteRecordRef) {
        if let Some(record) = self.records.lock().unwrap().get_mut(item) {
            record.remote = remote;
        }
    }

    pub fn remote_of(&self, item: &str) -> RemoteRecordRef {
        self.records
            .lock()
            .unwrap()
            .get(&id(item))
            .map(|r| r.remote.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl IRecordAccessor for MockAccessor {
    async fn get_record(&self, id: &ItemId) -> anyhow::Result<Option<SourceRecord>> {
        Ok(self.records.lock().unwrap().get(id).cloned())
    }

    async fn format_citation(
        &self,
        id: &ItemId,
        format: CitationFormat,
    ) -> anyhow::Result<Option<String>> {
        if self.broken_citations.lock().unwrap().contains(id) {
            anyhow::bail!("citation processor crashed");
        }
        Ok(self.citations.lock().unwrap().get(&(id.clone(), format)).cloned())
    }

    async fn resolve_file_path(&self, id: &ItemId) -> anyhow::Result<Option<PathBuf>> {
        Ok(self.files.lock().unwrap().get(id).cloned())
    }
}

// ============================================================================
// RecordingSink
// ============================================================================

/// Result sink that records outcomes and writes the remote ref back to the
/// catalog like a host would
pub struct RecordingSink {
    accessor: Arc<MockAccessor>,
    synced: Mutex<Vec<(ItemId, UpsertOutcome)>>,
    failures: Mutex<Vec<BatchFailure>>,
}

impl RecordingSink {
    pub fn new(accessor: Arc<MockAccessor>) -> Self {
        Self {
            accessor,
            synced: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
        }
    }

    pub fn synced(&self) -> Vec<(ItemId, UpsertOutcome)> {
        self.synced.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<BatchFailure> {
        self.failures.lock().unwrap().clone()
    }
}

#[async_trait]
impl IResultSink for RecordingSink {
    async fn record_synced(&self, item: &ItemId, outcome: &UpsertOutcome) -> anyhow::Result<()> {
        self.accessor
            .set_remote(item, RemoteRecordRef::from(outcome.clone()));
        self.synced.lock().unwrap().push((item.clone(), outcome.clone()));
        Ok(())
    }

    async fn batch_failed(&self, failure: &BatchFailure) -> anyhow::Result<()> {
        self.failures.lock().unwrap().push(failure.clone());
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub store: Arc<MockStore>,
    pub accessor: Arc<MockAccessor>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub fn new(schema: RemoteSchema) -> Self {
        let accessor = Arc::new(MockAccessor::new());
        Self {
            store: Arc::new(MockStore::new(schema)),
            sink: Arc::new(RecordingSink::new(Arc::clone(&accessor))),
            accessor,
        }
    }

    pub fn deps(&self) -> EngineDeps {
        EngineDeps {
            remote: self.store.clone(),
            accessor: self.accessor.clone(),
            sink: self.sink.clone(),
        }
    }
}
