//! Debounce queue - coalesces changed item ids into batches
//!
//! Every [`enqueue`](DebounceQueue::enqueue) merges ids into the pending
//! [`ChangeSet`] and restarts a fixed quiet-period timer, cancelling the
//! previous one. When the timer fires and no run is in flight, the whole
//! change set is handed to the coordinator over a channel and the queue
//! switches to [`RunState::Running`]. When a run is in flight the timer
//! does nothing; the coordinator picks the accumulated ids up through
//! [`finish_run`](DebounceQueue::finish_run) when its batch completes.
//!
//! ```text
//! enqueue ──→ ChangeSet + timer ──(quiet period)──→ fire
//!                                                    │
//!                         Idle: hand off batch ◄─────┤
//!                         Running: leave pending ◄───┘
//! ```
//!
//! Queue state sits behind one mutex that is never held across an await,
//! so the "check Idle, set Running, take the change set" step is atomic.

use std::collections::HashSet;
use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use refsync_core::domain::ItemId;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

// ============================================================================
// ChangeSet
// ============================================================================

/// Deduplicated set of item ids pending synchronization
///
/// Keeps first-insertion order so batches are processed predictably.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    ids: Vec<ItemId>,
    seen: HashSet<ItemId>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an id; returns false if it was already present
    pub fn insert(&mut self, id: ItemId) -> bool {
        if self.seen.insert(id.clone()) {
            self.ids.push(id);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemId> {
        self.ids.iter()
    }

    /// Consumes the set, returning ids in insertion order
    pub fn into_vec(self) -> Vec<ItemId> {
        self.ids
    }
}

impl Extend<ItemId> for ChangeSet {
    fn extend<I: IntoIterator<Item = ItemId>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}

impl FromIterator<ItemId> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = ItemId>>(iter: I) -> Self {
        let mut set = ChangeSet::new();
        set.extend(iter);
        set
    }
}

// ============================================================================
// DebounceQueue
// ============================================================================

/// Whether a synchronization pass is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: ChangeSet,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every (re)arm so a superseded timer that already woke up
    /// cannot fire
    generation: u64,
    run_state: RunState,
}

impl QueueState {
    fn is_settled(&self) -> bool {
        self.pending.is_empty() && self.timer.is_none() && self.run_state == RunState::Idle
    }
}

/// Debounced, single-flight hand-off of changed items to the coordinator
pub struct DebounceQueue {
    delay: Duration,
    state: Mutex<QueueState>,
    batch_tx: mpsc::UnboundedSender<Vec<ItemId>>,
    settled: Notify,
}

impl DebounceQueue {
    /// Creates a queue with the given quiet period
    ///
    /// Returns the queue and the receiver the coordinator drains batches from.
    pub fn new(delay: Duration) -> (Arc<Self>, mpsc::UnboundedReceiver<Vec<ItemId>>) {
        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        info!(debounce_ms = delay.as_millis() as u64, "Creating debounce queue");

        let queue = Arc::new(Self {
            delay,
            state: Mutex::new(QueueState::default()),
            batch_tx,
            settled: Notify::new(),
        });
        (queue, batch_rx)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Merges ids into the pending change set and restarts the timer
    pub fn enqueue<I>(self: &Arc<Self>, ids: I)
    where
        I: IntoIterator<Item = ItemId>,
    {
        let mut state = self.state();
        let before = state.pending.len();
        state.pending.extend(ids);

        if state.pending.is_empty() {
            return;
        }

        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.generation += 1;
        let generation = state.generation;

        let queue = Arc::downgrade(self);
        let delay = self.delay;
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(queue) = queue.upgrade() {
                queue.fire(generation);
            }
        }));

        debug!(
            added = state.pending.len() - before,
            pending = state.pending.len(),
            "Enqueued changed items, debounce timer restarted"
        );
    }

    /// Re-enqueues the unattempted remainder of an aborted batch
    pub fn requeue(self: &Arc<Self>, ids: Vec<ItemId>) {
        info!(count = ids.len(), "Requeueing unattempted items");
        self.enqueue(ids);
    }

    fn fire(&self, generation: u64) {
        let mut state = self.state();
        if state.generation != generation {
            return;
        }
        state.timer = None;

        match state.run_state {
            RunState::Running => {
                debug!(
                    pending = state.pending.len(),
                    "Quiet period elapsed during a run, deferring to re-drain"
                );
            }
            RunState::Idle => {
                if state.pending.is_empty() {
                    return;
                }
                let batch = std::mem::take(&mut state.pending).into_vec();
                let count = batch.len();
                state.run_state = RunState::Running;

                if self.batch_tx.send(batch).is_err() {
                    warn!(count, "Coordinator is gone, dropping batch");
                    state.run_state = RunState::Idle;
                    drop(state);
                    self.settled.notify_waiters();
                    return;
                }
                info!(count, "Batch handed to coordinator");
            }
        }
    }

    /// Called by the coordinator after each batch
    ///
    /// If ids accumulated during the run and their quiet period already
    /// elapsed, they are returned as the next batch and the queue stays
    /// `Running`. Otherwise the queue returns to `Idle` and any pending
    /// timer hands off the next batch when it fires.
    pub fn finish_run(&self) -> Option<Vec<ItemId>> {
        let mut state = self.state();

        if !state.pending.is_empty() && state.timer.is_none() {
            let batch = std::mem::take(&mut state.pending).into_vec();
            info!(count = batch.len(), "Re-draining items changed during the run");
            return Some(batch);
        }

        state.run_state = RunState::Idle;
        let settled = state.is_settled();
        drop(state);

        if settled {
            self.settled.notify_waiters();
        }
        None
    }

    pub fn run_state(&self) -> RunState {
        self.state().run_state
    }

    pub fn is_idle(&self) -> bool {
        self.run_state() == RunState::Idle
    }

    /// Number of ids waiting for the next batch
    pub fn pending_len(&self) -> usize {
        self.state().pending.len()
    }

    pub fn has_pending_timer(&self) -> bool {
        self.state().timer.is_some()
    }

    /// Returns true when nothing is pending, armed or running
    pub fn is_settled(&self) -> bool {
        self.state().is_settled()
    }

    /// Waits until the queue is settled
    pub async fn wait_settled(&self) {
        loop {
            let mut notified = pin!(self.settled.notified());
            notified.as_mut().enable();
            if self.is_settled() {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for DebounceQueue {
    fn drop(&mut self) {
        if let Some(timer) = self.state().timer.take() {
            timer.abort();
        }
    }
}
