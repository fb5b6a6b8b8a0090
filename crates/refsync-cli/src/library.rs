//! JSON-file catalog used by the command-line host
//!
//! The library file is a JSON document holding catalog items together with
//! their pre-rendered citations, attachment path and the remote reference
//! written back after each sync:
//!
//! ```json
//! {
//!   "items": [
//!     {
//!       "id": "ABCD2345",
//!       "title": "On Computable Numbers",
//!       "creators": [{"first_name": "Alan", "last_name": "Turing"}],
//!       "year": 1936,
//!       "tags": ["logic"],
//!       "citations": {"in_text": "(Turing, 1936)"},
//!       "remote": {"id": "59833787-2cf9-4fdf-8782-e53db20768a5", "url": "https://www.notion.so/59833787"}
//!     }
//!   ]
//! }
//! ```
//!
//! [`JsonLibrary`] is both the record accessor and the result sink: synced
//! items get their remote reference stored, optionally a marker tag, and
//! optionally a link to the remote record. Every change is persisted with a
//! write-to-temp + rename.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use refsync_core::domain::{ItemId, RemoteRecordRef, SourceRecord, UpsertOutcome};
use refsync_core::ports::{BatchFailure, CitationFormat, IRecordAccessor, IResultSink};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Title of the link recorded on synced items
pub const LINK_TITLE: &str = "Notion";

/// Pre-rendered citation strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bibliography: Option<String>,
}

/// A link attached to an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLink {
    pub title: String,
    pub url: String,
}

/// One catalog entry as stored in the library file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryItem {
    #[serde(flatten)]
    pub record: SourceRecord,
    #[serde(default)]
    pub citations: Citations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<ItemLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
    /// Last batch failure recorded against this item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl LibraryItem {
    pub fn new(record: SourceRecord) -> Self {
        Self {
            record,
            citations: Citations::default(),
            file_path: None,
            links: Vec::new(),
            synced_at: None,
            last_error: None,
        }
    }

    /// Stores the remote reference, marker tag and link after a sync
    fn apply_outcome(&mut self, outcome: &UpsertOutcome, synced_tag: Option<&str>, attach_link: bool) {
        self.record.remote = RemoteRecordRef::from(outcome.clone());
        self.synced_at = Some(Utc::now());
        self.last_error = None;

        if let Some(tag) = synced_tag {
            if !self.record.tags.iter().any(|t| t == tag) {
                self.record.tags.push(tag.to_string());
            }
        }

        if attach_link {
            match self.links.iter_mut().find(|l| l.title == LINK_TITLE) {
                Some(link) => link.url = outcome.url.clone(),
                None => self.links.push(ItemLink {
                    title: LINK_TITLE.to_string(),
                    url: outcome.url.clone(),
                }),
            }
        }
    }
}

/// Serialized form of the library file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryFile {
    #[serde(default)]
    pub items: Vec<LibraryItem>,
}

impl LibraryFile {
    fn find(&self, id: &ItemId) -> Option<&LibraryItem> {
        self.items.iter().find(|i| &i.record.id == id)
    }

    fn find_mut(&mut self, id: &ItemId) -> Option<&mut LibraryItem> {
        self.items.iter_mut().find(|i| &i.record.id == id)
    }
}

/// File-backed catalog implementing [`IRecordAccessor`] and [`IResultSink`]
pub struct JsonLibrary {
    path: PathBuf,
    synced_tag: Option<String>,
    attach_link: bool,
    data: Mutex<LibraryFile>,
}

impl JsonLibrary {
    /// Platform-appropriate default location of the library file
    ///
    /// Typically `$XDG_DATA_HOME/refsync/library.json` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("refsync")
            .join("library.json")
    }

    /// Loads the library at `path`
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid library.
    pub async fn open(path: &Path, synced_tag: Option<String>, attach_link: bool) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read library file {}", path.display()))?;
        let data: LibraryFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse library file {}", path.display()))?;

        info!(path = %path.display(), items = data.items.len(), "Loaded library");
        Ok(Self {
            path: path.to_path_buf(),
            synced_tag,
            attach_link,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifiers of every item, in file order
    pub async fn item_ids(&self) -> Vec<ItemId> {
        self.data
            .lock()
            .await
            .items
            .iter()
            .map(|i| i.record.id.clone())
            .collect()
    }

    /// Returns a copy of one item
    pub async fn item(&self, id: &ItemId) -> Option<LibraryItem> {
        self.data.lock().await.find(id).cloned()
    }

    async fn persist(&self, data: &LibraryFile) -> Result<()> {
        let json = serde_json::to_string_pretty(data).context("Failed to serialize library")?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = {
            let mut p = self.path.as_os_str().to_owned();
            p.push(".tmp");
            PathBuf::from(p)
        };
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace library file {}", self.path.display()))?;

        debug!(path = %self.path.display(), "Library saved");
        Ok(())
    }
}

#[async_trait::async_trait]
impl IRecordAccessor for JsonLibrary {
    async fn get_record(&self, id: &ItemId) -> Result<Option<SourceRecord>> {
        Ok(self.data.lock().await.find(id).map(|i| i.record.clone()))
    }

    async fn format_citation(&self, id: &ItemId, format: CitationFormat) -> Result<Option<String>> {
        let data = self.data.lock().await;
        let citation = data.find(id).and_then(|item| match format {
            CitationFormat::InText => item.citations.in_text.clone(),
            CitationFormat::Bibliography => item.citations.bibliography.clone(),
        });
        Ok(citation)
    }

    async fn resolve_file_path(&self, id: &ItemId) -> Result<Option<PathBuf>> {
        Ok(self.data.lock().await.find(id).and_then(|i| i.file_path.clone()))
    }
}

#[async_trait::async_trait]
impl IResultSink for JsonLibrary {
    async fn record_synced(&self, item: &ItemId, outcome: &UpsertOutcome) -> Result<()> {
        let mut data = self.data.lock().await;
        let Some(entry) = data.find_mut(item) else {
            warn!(item_id = %item, "Synced item vanished from the library");
            return Ok(());
        };

        entry.apply_outcome(outcome, self.synced_tag.as_deref(), self.attach_link);
        self.persist(&data).await
    }

    async fn batch_failed(&self, failure: &BatchFailure) -> Result<()> {
        let mut data = self.data.lock().await;
        if let Some(entry) = data.find_mut(&failure.item) {
            entry.last_error = Some(failure.error.clone());
        }
        self.persist(&data).await
    }
}
