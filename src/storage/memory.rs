//! # In-process store: append logs and event queues in memory.
//!
//! [`MemoryStore`] implements both storage seams without touching disk. It
//! backs the test suite and deployments that run a journal without a durable
//! store (rows survive only as long as the process).
//!
//! ## Fan-out
//! Delivery follows the per-subscriber bounded-queue model: each watcher
//! owns an independent `mpsc` queue, rows are offered with a non-blocking
//! `try_send`, and a watcher that falls behind loses rows (with a warning)
//! without slowing the writer or other watchers.
//!
//! ```text
//!    push_event_rows(dest, rows)
//!        │  (durable append under the store lock, then per-row fan-out)
//!        ├────────────────► [queue W1] ─► WatchStream::recv()
//!        ├────────────────► [queue W2] ─► WatchStream::recv()
//!        └────────────────► [queue WN] ─► WatchStream::recv()
//! ```
//!
//! ## Partitioning
//! Event batches are recorded under `<path-prefix>/<epoch-day>` before any
//! watcher is notified, so a crash between the two never acknowledges an
//! undelivered batch. The partition scheme is owned here, not by the broker.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::destinations::Destination;
use crate::error::JournalError;
use crate::journal::WatchHandle;
use crate::rows::Row;
use crate::storage::{AppendLog, AppendStore, QueueBackend};

/// Registered watcher: an independent bounded delivery queue.
struct Watcher {
    id: u64,
    tx: mpsc::Sender<Row>,
    token: CancellationToken,
}

struct Inner {
    watch_capacity: usize,
    watcher_seq: AtomicU64,
    /// All logs by canonical path: plain logs and event partitions alike.
    logs: Mutex<HashMap<String, Vec<Row>>>,
    /// Live watchers by queue name.
    watchers: Mutex<HashMap<String, Vec<Watcher>>>,
}

impl Inner {
    fn lock_logs(&self) -> MutexGuard<'_, HashMap<String, Vec<Row>>> {
        self.logs.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_watchers(&self) -> MutexGuard<'_, HashMap<String, Vec<Watcher>>> {
        self.watchers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn remove_watcher(&self, queue_name: &str, id: u64) {
        let mut watchers = self.lock_watchers();
        if let Some(list) = watchers.get_mut(queue_name) {
            list.retain(|w| w.id != id);
            if list.is_empty() {
                watchers.remove(queue_name);
            }
        }
    }
}

/// In-memory implementation of [`AppendStore`] and [`QueueBackend`].
///
/// Cheap to clone; clones share state. Rows appended while no watcher is
/// registered are stored but never replayed — subscriptions observe only
/// rows written after their own subscribe time.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Creates an empty store with the given per-watcher queue capacity.
    pub fn new(watch_capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                watch_capacity: watch_capacity.max(1),
                watcher_seq: AtomicU64::new(0),
                logs: Mutex::new(HashMap::new()),
                watchers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Creates a store sized from the journal configuration.
    pub fn from_config(config: &crate::config::JournalConfig) -> Self {
        Self::new(config.watch_capacity_clamped())
    }

    /// Rows currently stored at `path`, in write order.
    pub fn rows_at(&self, path: &str) -> Vec<Row> {
        self.inner
            .lock_logs()
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    /// Total rows stored under a path prefix (all partitions of a stream).
    pub fn rows_under(&self, prefix: &str) -> usize {
        self.inner
            .lock_logs()
            .iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .map(|(_, rows)| rows.len())
            .sum()
    }

    /// Number of live watchers on a queue.
    pub fn watcher_count(&self, queue_name: &str) -> usize {
        self.inner
            .lock_watchers()
            .get(queue_name)
            .map(|list| list.len())
            .unwrap_or(0)
    }

    fn partition_path(destination: &Destination) -> String {
        let day = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() / 86_400)
            .unwrap_or(0);
        format!("{}/{}", destination.path, day)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl AppendStore for MemoryStore {
    fn open_append(&self, path: &str) -> Result<Box<dyn AppendLog>, JournalError> {
        // Ensure the log exists so an empty batch still creates it.
        self.inner.lock_logs().entry(path.to_string()).or_default();
        Ok(Box::new(MemoryAppendLog {
            inner: Arc::clone(&self.inner),
            path: path.to_string(),
        }))
    }
}

/// Open append session on one in-memory log.
///
/// Writes land directly in the shared log; callers that need batch
/// contiguity under concurrency hold the broker's per-path lock, exactly as
/// they would over a shared file.
struct MemoryAppendLog {
    inner: Arc<Inner>,
    path: String,
}

impl AppendLog for MemoryAppendLog {
    fn write(&mut self, row: &Row) -> Result<(), JournalError> {
        let mut logs = self.inner.lock_logs();
        logs.entry(self.path.clone()).or_default().push(row.clone());
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), JournalError> {
        Ok(())
    }
}

#[async_trait]
impl QueueBackend for MemoryStore {
    async fn watch(&self, queue_name: &str, token: CancellationToken) -> WatchHandle {
        let sub_token = token.child_token();
        let id = self.inner.watcher_seq.fetch_add(1, AtomicOrdering::Relaxed);
        let (tx, rx) = mpsc::channel(self.inner.watch_capacity);

        {
            let mut watchers = self.inner.lock_watchers();
            watchers.entry(queue_name.to_string()).or_default().push(Watcher {
                id,
                tx,
                token: sub_token.clone(),
            });
        }
        debug!(queue = queue_name, watcher = id, "watcher registered");

        // Unregister promptly on cancellation so the writer stops cloning
        // rows for a dead subscription.
        let inner = Arc::clone(&self.inner);
        let queue = queue_name.to_string();
        let cleanup_token = sub_token.clone();
        tokio::spawn(async move {
            cleanup_token.cancelled().await;
            inner.remove_watcher(&queue, id);
            debug!(queue = %queue, watcher = id, "watcher unregistered");
        });

        WatchHandle::new(rx, sub_token)
    }

    async fn push_event_rows(
        &self,
        destination: &Destination,
        rows: &[Row],
    ) -> Result<(), JournalError> {
        let partition = Self::partition_path(destination);

        // Durable write first, then notify; both under the store lock so
        // concurrent pushes to one queue keep a single total order.
        let mut logs = self.inner.lock_logs();
        logs.entry(partition).or_default().extend_from_slice(rows);

        let mut watchers = self.inner.lock_watchers();
        if let Some(list) = watchers.get_mut(&destination.queue_name) {
            for row in rows {
                list.retain(|watcher| {
                    if watcher.token.is_cancelled() {
                        return false;
                    }
                    match watcher.tx.try_send(row.clone()) {
                        Ok(()) => true,
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            warn!(
                                queue = %destination.queue_name,
                                watcher = watcher.id,
                                "watcher queue full; dropping row"
                            );
                            true
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => false,
                    }
                });
            }
            if list.is_empty() {
                watchers.remove(&destination.queue_name);
            }
        }
        Ok(())
    }
}
