//! # JournalBroker: the local, authoritative journal implementation.
//!
//! The broker is the single synchronization point between "write this data"
//! and "notify anyone watching this data" inside one process. Per write it
//! classifies the destination as plain or event and dispatches:
//!
//! ```text
//! push_rows(artifact, ...) ──► resolve ──┬─ Plain ──► per-path lock ─► AppendStore
//! append(path, rows) ────────────────────┘
//!                                        └─ Event ──► QueueBackend::push_event_rows
//! watch(queue) ──────────────────────────────────────► QueueBackend::watch
//!                                                      (idle handle when absent)
//! ```
//!
//! ## Rules
//! - Concurrent appends to one path are serialized by the
//!   [`PathLockTable`](crate::broker::PathLockTable); writers to different
//!   paths never block each other.
//! - The appender is closed on every exit path, including mid-batch failure.
//! - Event batches are delegated wholesale: the backend owns partitioning,
//!   replication and its own locking, and its result is returned unmodified.
//! - A broker without a backend is a valid state: event writes fail with
//!   [`BackendUnavailable`](crate::JournalError::BackendUnavailable) (loudly,
//!   never silently dropped) and watches degrade to idle handles.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::broker::PathLockTable;
use crate::destinations::ResolveDestination;
use crate::error::JournalError;
use crate::journal::{Journal, WatchHandle};
use crate::rows::Row;
use crate::storage::{AppendStore, QueueBackend};

/// Routing and coordination for journal writes on the authoritative node.
pub struct JournalBroker {
    resolver: Arc<dyn ResolveDestination>,
    store: Arc<dyn AppendStore>,
    /// Set at most once, at construction; replaced only wholesale via a new
    /// instance through the slot, so reads need no locking.
    backend: Option<Arc<dyn QueueBackend>>,
    locks: PathLockTable,
}

impl JournalBroker {
    /// Creates a broker with no queue backend.
    ///
    /// Valid configuration: watchers are never notified and event writes
    /// fail with [`BackendUnavailable`](crate::JournalError::BackendUnavailable).
    pub fn new(resolver: Arc<dyn ResolveDestination>, store: Arc<dyn AppendStore>) -> Self {
        Self {
            resolver,
            store,
            backend: None,
            locks: PathLockTable::new(),
        }
    }

    /// Attaches the queue backend capability.
    pub fn with_backend(mut self, backend: Arc<dyn QueueBackend>) -> Self {
        self.backend = Some(backend);
        self
    }
}

#[async_trait]
impl Journal for JournalBroker {
    async fn append(&self, path: &str, rows: &[Row]) -> Result<(), JournalError> {
        // Table lock only guards the map; the per-path lock guards the write.
        let lock = self.locks.lock_for(path);
        let _guard = lock.lock().await;

        let mut appender = self.store.open_append(path)?;
        for row in rows {
            if let Err(err) = appender.write(row) {
                // Close exactly once even on mid-batch failure; the write
                // error is the one worth surfacing.
                let _ = appender.close();
                return Err(err);
            }
        }
        appender.close()?;
        debug!(path, rows = rows.len(), "appended batch");
        Ok(())
    }

    async fn push_rows(
        &self,
        artifact: &str,
        source: Option<&str>,
        client_id: Option<&str>,
        flow_id: Option<&str>,
        rows: &[Row],
    ) -> Result<(), JournalError> {
        let destination = self.resolver.resolve(artifact, source, client_id, flow_id)?;

        if !destination.is_event() {
            return self.append(&destination.path, rows).await;
        }

        match &self.backend {
            Some(backend) => backend.push_event_rows(&destination, rows).await,
            None => Err(JournalError::BackendUnavailable),
        }
    }

    async fn watch(&self, queue_name: &str, token: CancellationToken) -> WatchHandle {
        match &self.backend {
            Some(backend) => {
                info!(queue = queue_name, "watching for events");
                backend.watch(queue_name, token).await
            }
            // Readers block on a stream that never yields.
            None => WatchHandle::idle(&token),
        }
    }

    fn queue_backend(&self) -> Option<Arc<dyn QueueBackend>> {
        self.backend.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destinations::{ArtifactCatalog, ArtifactDefinition};
    use crate::storage::{AppendLog, MemoryStore};
    use std::sync::Mutex;
    use std::time::Duration;

    fn catalog() -> Arc<ArtifactCatalog> {
        let catalog = ArtifactCatalog::new();
        catalog.register(ArtifactDefinition::client_plain("Custom.Collector"));
        catalog.register(ArtifactDefinition::event("Server.Monitor.Health"));
        Arc::new(catalog)
    }

    fn row(writer: i64, n: i64) -> Row {
        Row::new().with("writer", writer).with("n", n)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_batches_never_interleave() {
        let store = MemoryStore::default();
        let broker = Arc::new(JournalBroker::new(catalog(), Arc::new(store.clone())));
        let path = "clients/C.1/artifacts/Custom.Collector/F.1";

        let mut handles = Vec::new();
        for writer in 0..8i64 {
            let broker = Arc::clone(&broker);
            handles.push(tokio::spawn(async move {
                let batch: Vec<Row> = (0..10).map(|n| row(writer, n)).collect();
                broker.append(path, &batch).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let rows = store.rows_at(path);
        assert_eq!(rows.len(), 80);

        // Each writer's batch must appear contiguously and in order.
        for chunk in rows.chunks(10) {
            let writer = chunk[0].get("writer").unwrap().clone();
            for (n, got) in chunk.iter().enumerate() {
                assert_eq!(got.get("writer"), Some(&writer), "batches interleaved");
                assert_eq!(got.get("n"), Some(&(n as i64).into()));
            }
        }
    }

    #[tokio::test]
    async fn test_paths_do_not_block_each_other() {
        let store = MemoryStore::default();
        let broker = JournalBroker::new(catalog(), Arc::new(store.clone()));

        // Hold the per-path lock for "a" while writing to "b".
        let lock_a = broker.locks.lock_for("a");
        let _guard = lock_a.lock().await;

        let done = tokio::time::timeout(
            Duration::from_secs(1),
            broker.append("b", &[row(0, 0)]),
        )
        .await;
        assert!(done.is_ok(), "write to b blocked on lock for a");
        assert_eq!(store.rows_at("b").len(), 1);
    }

    #[tokio::test]
    async fn test_event_write_without_backend_fails_loud() {
        let store = MemoryStore::default();
        let broker = JournalBroker::new(catalog(), Arc::new(store.clone()));

        let err = broker
            .push_rows("Server.Monitor.Health", None, None, None, &[row(0, 0)])
            .await
            .unwrap_err();
        assert_eq!(err, JournalError::BackendUnavailable);
        // And no partial write happened.
        assert_eq!(store.rows_under("server_events/Server.Monitor.Health"), 0);
    }

    #[tokio::test]
    async fn test_watch_without_backend_is_idle() {
        let store = MemoryStore::default();
        let broker = JournalBroker::new(catalog(), Arc::new(store));
        let token = CancellationToken::new();

        let mut handle = broker.watch("Server.Monitor.Health", token).await;
        let pending =
            tokio::time::timeout(Duration::from_millis(50), handle.stream.recv()).await;
        assert!(pending.is_err(), "idle watch must not yield or close");

        handle.cancel.cancel();
        handle.cancel.cancel();
        assert_eq!(handle.stream.recv().await, None);
    }

    #[tokio::test]
    async fn test_event_write_delegates_to_backend() {
        let store = MemoryStore::default();
        let broker = JournalBroker::new(catalog(), Arc::new(store.clone()))
            .with_backend(Arc::new(store.clone()));

        let mut handle = broker
            .watch("Server.Monitor.Health", CancellationToken::new())
            .await;

        broker
            .push_rows("Server.Monitor.Health", None, None, None, &[row(1, 1)])
            .await
            .unwrap();

        let got = handle.stream.recv().await.unwrap();
        assert_eq!(got.get("writer"), Some(&1.into()));
        assert_eq!(store.rows_under("server_events/Server.Monitor.Health"), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_racing_routes_land_all_rows() {
        let store = MemoryStore::default();
        let broker = Arc::new(JournalBroker::new(catalog(), Arc::new(store.clone())));

        let mut handles = Vec::new();
        for batch in 0..2i64 {
            let broker = Arc::clone(&broker);
            handles.push(tokio::spawn(async move {
                let rows: Vec<Row> = (0..3).map(|n| row(batch, n)).collect();
                broker
                    .push_rows("Custom.Collector", None, Some("C.1"), Some("R.1"), &rows)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let rows = store.rows_at("clients/C.1/artifacts/Custom.Collector/R.1");
        assert_eq!(rows.len(), 6, "duplicated or lost rows");
        for chunk in rows.chunks(3) {
            let writer = chunk[0].get("writer").unwrap().clone();
            for got in chunk {
                assert_eq!(got.get("writer"), Some(&writer), "batches interleaved");
            }
        }
    }

    #[tokio::test]
    async fn test_unresolved_artifact_is_surfaced() {
        let store = MemoryStore::default();
        let broker = JournalBroker::new(catalog(), Arc::new(store));
        let err = broker
            .push_rows("No.Such.Artifact", None, None, None, &[row(0, 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, JournalError::Resolution { .. }));
    }

    /// Store whose appender fails on the second write; proves close runs
    /// exactly once even on mid-batch failure.
    struct FlakyStore {
        closed: Arc<Mutex<u32>>,
    }

    struct FlakyAppender {
        writes: u32,
        closed: Arc<Mutex<u32>>,
    }

    impl AppendStore for FlakyStore {
        fn open_append(&self, _path: &str) -> Result<Box<dyn AppendLog>, JournalError> {
            Ok(Box::new(FlakyAppender {
                writes: 0,
                closed: Arc::clone(&self.closed),
            }))
        }
    }

    impl AppendLog for FlakyAppender {
        fn write(&mut self, _row: &Row) -> Result<(), JournalError> {
            self.writes += 1;
            if self.writes >= 2 {
                return Err(JournalError::storage("flaky", "write failed"));
            }
            Ok(())
        }

        fn close(self: Box<Self>) -> Result<(), JournalError> {
            *self.closed.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_mid_batch_failure_still_closes_appender() {
        let closed = Arc::new(Mutex::new(0));
        let store = FlakyStore {
            closed: Arc::clone(&closed),
        };
        let broker = JournalBroker::new(catalog(), Arc::new(store));

        let batch: Vec<Row> = (0..3).map(|n| row(0, n)).collect();
        let err = broker.append("flaky", &batch).await.unwrap_err();
        assert!(matches!(err, JournalError::Storage { .. }));
        assert_eq!(*closed.lock().unwrap(), 1, "appender must close exactly once");

        // The per-path lock was released: the next write proceeds.
        let done = tokio::time::timeout(
            Duration::from_secs(1),
            broker.append("flaky", &batch[..1]),
        )
        .await;
        assert!(done.is_ok());
    }
}
