//! Sync coordinator - sequential, single-flight batch processing
//!
//! A batch is processed one item at a time: resolve the record, build its
//! payload, upsert it, report the outcome. The first unrecovered error
//! aborts the rest of the batch. After each batch the coordinator asks the
//! [`DebounceQueue`] for ids that settled while it was running and keeps
//! draining until there are none, then the queue returns to idle.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use refsync_core::domain::{ItemId, UpsertOutcome};
use refsync_core::ports::{BatchFailure, IRecordAccessor, IResultSink};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::mapper::PropertyMapper;
use crate::queue::DebounceQueue;
use crate::upsert::UpsertClient;
use crate::SyncError;

// ============================================================================
// BatchReport
// ============================================================================

/// Summary of one processed batch
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// When processing started
    pub started_at: DateTime<Utc>,
    /// Items upserted successfully, in processing order
    pub synced: Vec<(ItemId, UpsertOutcome)>,
    /// Items the catalog no longer knows about
    pub skipped: Vec<ItemId>,
    /// The error that aborted the batch, if any
    pub failure: Option<BatchFailure>,
    /// Wall-clock processing time
    pub duration: Duration,
}

impl BatchReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            synced: Vec::new(),
            skipped: Vec::new(),
            failure: None,
            duration: Duration::ZERO,
        }
    }

    /// Returns true if no item aborted the batch
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Number of items an upsert was attempted for
    pub fn attempted(&self) -> usize {
        self.synced.len() + usize::from(self.failure.is_some())
    }
}

// ============================================================================
// SyncCoordinator
// ============================================================================

/// Drains batches into sequential upserts
///
/// ## Dependencies
///
/// - `accessor`: resolves item ids to catalog records
/// - `mapper`: builds schema-filtered payloads
/// - `upsert`: update-or-create against the remote
/// - `sink`: receives successes and batch failures
pub struct SyncCoordinator {
    accessor: Arc<dyn IRecordAccessor>,
    mapper: PropertyMapper,
    upsert: UpsertClient,
    sink: Arc<dyn IResultSink>,
    /// Re-enqueue the unattempted remainder of an aborted batch
    requeue_on_abort: bool,
}

impl SyncCoordinator {
    pub fn new(
        accessor: Arc<dyn IRecordAccessor>,
        mapper: PropertyMapper,
        upsert: UpsertClient,
        sink: Arc<dyn IResultSink>,
        requeue_on_abort: bool,
    ) -> Self {
        Self {
            accessor,
            mapper,
            upsert,
            sink,
            requeue_on_abort,
        }
    }

    pub fn mapper(&self) -> &PropertyMapper {
        &self.mapper
    }

    pub fn requeue_on_abort(&self) -> bool {
        self.requeue_on_abort
    }

    /// Processes one batch of items in order
    ///
    /// Items that cannot be resolved are skipped. The first mapping or
    /// upsert error stops the batch; the failed item and the unattempted
    /// remainder are reported through the sink.
    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn process_batch(&self, ids: &[ItemId]) -> BatchReport {
        let started = Instant::now();
        let mut report = BatchReport::new();
        info!("Starting sync batch");

        for (index, id) in ids.iter().enumerate() {
            match self.sync_item(id).await {
                Ok(Some(outcome)) => {
                    if let Err(e) = self.sink.record_synced(id, &outcome).await {
                        warn!(item_id = %id, error = %e, "Result sink failed to record sync");
                    }
                    report.synced.push((id.clone(), outcome));
                }
                Ok(None) => {
                    warn!(item_id = %id, "Item no longer exists in the catalog, skipping");
                    report.skipped.push(id.clone());
                }
                Err(err) => {
                    let unattempted = ids[index + 1..].to_vec();
                    error!(
                        item_id = %id,
                        unattempted = unattempted.len(),
                        "Sync batch aborted: {err:#}"
                    );

                    let failure = BatchFailure {
                        item: id.clone(),
                        error: err.to_string(),
                        unattempted,
                    };
                    if let Err(e) = self.sink.batch_failed(&failure).await {
                        warn!(error = %e, "Result sink failed to record batch failure");
                    }
                    report.failure = Some(failure);
                    break;
                }
            }
        }

        report.duration = started.elapsed();
        info!(
            synced = report.synced.len(),
            skipped = report.skipped.len(),
            failed = report.failure.is_some(),
            duration_ms = report.duration.as_millis() as u64,
            "Sync batch finished"
        );
        report
    }

    async fn sync_item(&self, id: &ItemId) -> Result<Option<UpsertOutcome>, SyncError> {
        let record = self
            .accessor
            .get_record(id)
            .await
            .map_err(|e| SyncError::Resolve {
                item: id.clone(),
                message: format!("{e:#}"),
            })?;

        let Some(record) = record else {
            return Ok(None);
        };

        let payload = self.mapper.build_payload(&record).await?;
        let outcome = self.upsert.upsert(&record.remote, &payload).await?;
        debug!(item_id = %id, remote_id = %outcome.id, "Item synced");
        Ok(Some(outcome))
    }

    /// Worker loop fed by the debounce queue
    ///
    /// Receives batches until the channel closes or `shutdown` is cancelled.
    /// A batch in progress always runs to completion.
    pub async fn run_loop(
        &self,
        queue: Arc<DebounceQueue>,
        mut batches: mpsc::UnboundedReceiver<Vec<ItemId>>,
        shutdown: CancellationToken,
    ) {
        info!("Sync coordinator started");

        loop {
            let batch = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, coordinator stopping");
                    break;
                }
                batch = batches.recv() => match batch {
                    Some(batch) => batch,
                    None => {
                        info!("Batch channel closed, coordinator stopping");
                        break;
                    }
                },
            };

            let mut next = Some(batch);
            while let Some(ids) = next {
                let report = self.process_batch(&ids).await;

                if self.requeue_on_abort {
                    if let Some(failure) = &report.failure {
                        if !failure.unattempted.is_empty() {
                            queue.requeue(failure.unattempted.clone());
                        }
                    }
                }

                next = queue.finish_run();
            }
        }

        info!("Sync coordinator stopped");
    }
}
