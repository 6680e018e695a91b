//! # Journal lifecycle: role dispatch, hot-swap, shutdown.
//!
//! [`start`] is the single entry point the embedding process calls once the
//! cluster role is known. It decides which [`Journal`](crate::Journal)
//! implementation to install:
//!
//! ```text
//! start(config, deps, slot, shutdown)
//!   │
//!   ├─ role = Minion and transport present?
//!   │     ├─ ReplicationJournal::connect() ── Ok ──► install stub, done
//!   │     └─ connect failed ──► warn, fall through (degraded local-only)
//!   │
//!   └─ local JournalBroker:
//!         backend = deps.backend
//!                   else previous instance's backend   (hot-swap carry-over)
//!         install broker
//!
//! shutdown token fires ──► slot.clear() first, then return
//!   (outstanding subscriptions degrade to the idle-watch behavior)
//! ```
//!
//! ## Rules
//! - "Replication configured but unreachable" degrades to local-only
//!   operation with an empty backend; it never crashes the process.
//! - A restart without an explicit backend inherits the previously
//!   installed instance's backend, so a configuration reload does not lose
//!   a live backend.
//! - Deregistration happens before any other resource is released.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::broker::{JournalBroker, JournalSlot, ReplicationJournal, ReplicationTransport};
use crate::config::JournalConfig;
use crate::destinations::ResolveDestination;
use crate::journal::JournalRef;
use crate::storage::{AppendStore, QueueBackend};

/// External capabilities handed to [`start`].
///
/// `backend` and `transport` are both optional: a process may run without a
/// storage subsystem (journaling disabled for events), and only minions
/// carry a transport.
pub struct JournalDeps {
    /// Destination resolution (artifact definitions).
    pub resolver: Arc<dyn ResolveDestination>,
    /// Append-only log store for plain destinations.
    pub store: Arc<dyn AppendStore>,
    /// Queue backend for event destinations, if configured.
    pub backend: Option<Arc<dyn QueueBackend>>,
    /// Transport to the authoritative node, for minion roles.
    pub transport: Option<Arc<dyn ReplicationTransport>>,
}

/// Selects, builds and installs the journal implementation for this process.
///
/// Returns the installed instance. Installation is atomic; a concurrent
/// reader of `slot` observes either the previous instance or the new one.
/// When `shutdown` fires, the slot is cleared before anything else.
pub async fn start(
    config: &JournalConfig,
    deps: JournalDeps,
    slot: &Arc<JournalSlot>,
    shutdown: CancellationToken,
) -> JournalRef {
    // Minions try the forwarding stub first; only a failed connect falls
    // back to a local (storage-less for events, unless a backend was
    // provided) journal.
    if !config.role.is_master() {
        if let Some(transport) = deps.transport.clone() {
            match ReplicationJournal::connect(transport).await {
                Ok(stub) => {
                    let journal: JournalRef = Arc::new(stub);
                    install(slot, journal.clone(), shutdown);
                    info!("starting journal service (replication stub)");
                    return journal;
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        "replication unreachable; degrading to local journal"
                    );
                }
            }
        }
    }

    // A journal with no backend is valid: watchers are never notified and
    // event writes fail with BackendUnavailable.
    let inherited = slot.current().and_then(|previous| previous.queue_backend());
    let backend = deps.backend.or(inherited);

    let mut broker = JournalBroker::new(deps.resolver, deps.store);
    if let Some(backend) = backend {
        broker = broker.with_backend(backend);
    }

    let journal: JournalRef = Arc::new(broker);
    install(slot, journal.clone(), shutdown);
    info!("starting journal service");
    journal
}

fn install(slot: &Arc<JournalSlot>, journal: JournalRef, shutdown: CancellationToken) {
    slot.install(journal);

    let slot = Arc::clone(slot);
    tokio::spawn(async move {
        shutdown.cancelled().await;
        // Deregister first; outstanding watchers degrade to idle behavior.
        slot.clear();
        info!("journal service deregistered");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeRole;
    use crate::destinations::{ArtifactCatalog, ArtifactDefinition};
    use crate::error::JournalError;
    use crate::journal::WatchHandle;
    use crate::rows::Row;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    fn catalog() -> Arc<ArtifactCatalog> {
        let catalog = ArtifactCatalog::new();
        catalog.register(ArtifactDefinition::event("Server.Monitor.Health"));
        Arc::new(catalog)
    }

    fn deps(store: &MemoryStore, with_backend: bool) -> JournalDeps {
        JournalDeps {
            resolver: catalog(),
            store: Arc::new(store.clone()),
            backend: with_backend.then(|| Arc::new(store.clone()) as Arc<dyn QueueBackend>),
            transport: None,
        }
    }

    struct StubTransport {
        reachable: bool,
        appends: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ReplicationTransport for StubTransport {
        async fn connect(&self) -> Result<(), JournalError> {
            if self.reachable {
                Ok(())
            } else {
                Err(JournalError::Replication {
                    reason: "unreachable".into(),
                })
            }
        }

        async fn append(&self, path: &str, _rows: &[Row]) -> Result<(), JournalError> {
            self.appends.lock().unwrap().push(path.to_string());
            Ok(())
        }

        async fn push_rows(
            &self,
            _artifact: &str,
            _source: Option<&str>,
            _client_id: Option<&str>,
            _flow_id: Option<&str>,
            _rows: &[Row],
        ) -> Result<(), JournalError> {
            Ok(())
        }

        async fn watch(
            &self,
            _queue_name: &str,
            token: CancellationToken,
        ) -> Result<WatchHandle, JournalError> {
            let (_tx, rx) = tokio::sync::mpsc::channel(1);
            Ok(WatchHandle::new(rx, token.child_token()))
        }
    }

    #[tokio::test]
    async fn test_hot_swap_preserves_backend() {
        let store = MemoryStore::default();
        let slot = Arc::new(JournalSlot::new());
        let config = JournalConfig::default();

        // First start carries a backend.
        start(&config, deps(&store, true), &slot, CancellationToken::new()).await;

        // Restart without one: the backend must be inherited.
        let journal = start(&config, deps(&store, false), &slot, CancellationToken::new()).await;
        assert!(journal.queue_backend().is_some());

        slot.push_rows("Server.Monitor.Health", None, None, None, &[Row::new().with("n", 1)])
            .await
            .unwrap();
        assert_eq!(store.rows_under("server_events/Server.Monitor.Health"), 1);
    }

    #[tokio::test]
    async fn test_minion_installs_stub_when_reachable() {
        let store = MemoryStore::default();
        let slot = Arc::new(JournalSlot::new());
        let transport = Arc::new(StubTransport {
            reachable: true,
            appends: Mutex::new(Vec::new()),
        });

        let mut deps = deps(&store, false);
        deps.transport = Some(transport.clone());
        let config = JournalConfig {
            role: NodeRole::Minion,
            ..JournalConfig::default()
        };

        start(&config, deps, &slot, CancellationToken::new()).await;
        slot.append("a/b", &[Row::new()]).await.unwrap();

        // The write was forwarded, not applied locally.
        assert_eq!(transport.appends.lock().unwrap().clone(), vec!["a/b"]);
        assert!(store.rows_at("a/b").is_empty());
    }

    #[tokio::test]
    async fn test_minion_falls_back_to_local_when_unreachable() {
        let store = MemoryStore::default();
        let slot = Arc::new(JournalSlot::new());
        let transport = Arc::new(StubTransport {
            reachable: false,
            appends: Mutex::new(Vec::new()),
        });

        let mut deps = deps(&store, false);
        deps.transport = Some(transport);
        let config = JournalConfig {
            role: NodeRole::Minion,
            ..JournalConfig::default()
        };

        let journal = start(&config, deps, &slot, CancellationToken::new()).await;

        // Local journal with an empty backend: event writes fail loudly.
        assert!(journal.queue_backend().is_none());
        let err = slot
            .push_rows("Server.Monitor.Health", None, None, None, &[Row::new()])
            .await
            .unwrap_err();
        assert_eq!(err, JournalError::BackendUnavailable);

        // Plain appends still work locally.
        slot.append("a/b", &[Row::new()]).await.unwrap();
        assert_eq!(store.rows_at("a/b").len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_clears_slot_first() {
        let store = MemoryStore::default();
        let slot = Arc::new(JournalSlot::new());
        let shutdown = CancellationToken::new();

        start(&JournalConfig::default(), deps(&store, true), &slot, shutdown.clone()).await;
        assert!(!slot.is_empty());

        shutdown.cancel();
        for _ in 0..50 {
            if slot.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(slot.is_empty(), "slot not cleared after shutdown");

        // Watchers created afterwards get the idle behavior, not an error.
        let mut handle = slot.watch("Q", CancellationToken::new()).await;
        let pending =
            tokio::time::timeout(Duration::from_millis(50), handle.stream.recv()).await;
        assert!(pending.is_err());
    }
}
