//! Result sink port (driving side of a sync run)
//!
//! After each successful upsert the engine hands the outcome to the sink so
//! the host can persist the remote reference, tag the item, or attach a link.
//! A batch that aborts is reported once with the failing item and the items
//! that were never attempted.

use serde::{Deserialize, Serialize};

use crate::domain::newtypes::ItemId;
use crate::domain::record::UpsertOutcome;

/// Description of an aborted batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Item whose processing failed
    pub item: ItemId,
    /// Human-readable failure description, including the error chain
    pub error: String,
    /// Items after the failing one that were not attempted
    pub unattempted: Vec<ItemId>,
}

/// Port trait receiving sync results
#[async_trait::async_trait]
pub trait IResultSink: Send + Sync {
    /// Called after the item's remote record was created or updated
    async fn record_synced(&self, item: &ItemId, outcome: &UpsertOutcome) -> anyhow::Result<()>;

    /// Called once when a batch aborts
    async fn batch_failed(&self, failure: &BatchFailure) -> anyhow::Result<()>;
}
