//! Record accessor port (driven/secondary port)
//!
//! Read-only access to the source reference catalog. The host application
//! implements this; every getter may suspend (catalog reads, citation
//! formatting and attachment resolution are asynchronous in most hosts).
//!
//! Uses `anyhow::Result` because failures here are host-specific and need no
//! domain classification.

use std::path::PathBuf;

use crate::domain::newtypes::ItemId;
use crate::domain::record::SourceRecord;

/// Citation string variants the catalog can synthesize for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CitationFormat {
    /// Full bibliography entry
    Bibliography,
    /// Short in-text form, e.g. "(Turing, 1936)"
    InText,
}

/// Port trait for reading catalog items
#[async_trait::async_trait]
pub trait IRecordAccessor: Send + Sync {
    /// Loads a snapshot of the item
    ///
    /// Returns `Ok(None)` when the item no longer exists in the catalog.
    async fn get_record(&self, id: &ItemId) -> anyhow::Result<Option<SourceRecord>>;

    /// Formats a citation for the item in the requested variant
    ///
    /// Returns `Ok(None)` when the catalog cannot produce one.
    async fn format_citation(
        &self,
        id: &ItemId,
        format: CitationFormat,
    ) -> anyhow::Result<Option<String>>;

    /// Resolves the local path of the item's primary file attachment
    async fn resolve_file_path(&self, id: &ItemId) -> anyhow::Result<Option<PathBuf>>;
}
