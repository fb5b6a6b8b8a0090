//! Change notifier adapter
//!
//! Bridges host change notifications into the [`DebounceQueue`]. Items
//! added to the tracked collection are always forwarded; modifications are
//! forwarded only when sync-on-modify is enabled.

use std::sync::Arc;

use refsync_core::domain::ItemId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::queue::DebounceQueue;

/// Kind of change reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Items were added to the tracked collection
    Added,
    /// Tracked items were edited
    Modified,
}

/// A batch of changed items from the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub kind: ChangeKind,
    pub items: Vec<ItemId>,
}

impl ChangeNotification {
    pub fn new(kind: ChangeKind, items: Vec<ItemId>) -> Self {
        Self { kind, items }
    }
}

/// Filters host notifications and forwards them to the queue
pub struct ChangeNotifierAdapter {
    queue: Arc<DebounceQueue>,
    sync_on_modify: bool,
}

impl ChangeNotifierAdapter {
    pub fn new(queue: Arc<DebounceQueue>, sync_on_modify: bool) -> Self {
        Self {
            queue,
            sync_on_modify,
        }
    }

    /// Returns true if notifications of this kind trigger a sync
    pub fn accepts(&self, kind: ChangeKind) -> bool {
        match kind {
            ChangeKind::Added => true,
            ChangeKind::Modified => self.sync_on_modify,
        }
    }

    /// Forwards a notification to the queue if its kind is accepted
    ///
    /// Returns true if the items were enqueued.
    pub fn handle(&self, notification: ChangeNotification) -> bool {
        if !self.accepts(notification.kind) {
            debug!(
                kind = ?notification.kind,
                count = notification.items.len(),
                "Ignoring notification, sync on modify is disabled"
            );
            return false;
        }
        if notification.items.is_empty() {
            return false;
        }

        debug!(
            kind = ?notification.kind,
            count = notification.items.len(),
            "Forwarding change notification"
        );
        self.queue.enqueue(notification.items);
        true
    }

    /// Consumes notifications until the channel closes or `shutdown` fires
    ///
    /// Returns the number of notifications forwarded to the queue.
    pub async fn run(
        &self,
        mut notifications: mpsc::Receiver<ChangeNotification>,
        shutdown: CancellationToken,
    ) -> usize {
        let mut forwarded = 0;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                notification = notifications.recv() => match notification {
                    Some(notification) => {
                        if self.handle(notification) {
                            forwarded += 1;
                        }
                    }
                    None => break,
                },
            }
        }

        info!(forwarded, "Change notifier stopped");
        forwarded
    }
}
