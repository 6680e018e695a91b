//! # rowjournal
//!
//! **rowjournal** is the event journal broker for a distributed
//! endpoint-monitoring server: it accepts batches of structured rows from
//! collection tasks, durably appends them to named append-only logs, and
//! fans them out live to in-process watchers of a queue name. It is the
//! single synchronization point between "write this data" and "notify
//! anyone watching this data" inside one server process.
//!
//! ## Architecture
//! ```text
//!    producers                                   consumers
//!    (collectors, query plugins)                 (query plugins tailing live data)
//!        │ push_rows / append                        │ watch(queue, token)
//!        ▼                                           ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  JournalSlot (swappable "current journal" handle)                 │
//! └──────────────┬────────────────────────────────────┬───────────────┘
//!                ▼ master                             ▼ minion
//! ┌──────────────────────────────┐      ┌──────────────────────────────┐
//! │  JournalBroker               │      │  ReplicationJournal          │
//! │  - resolve destination       │      │  (forwards every operation   │
//! │  - Plain ─► PathLockTable    │      │   to the authoritative node  │
//! │            └► AppendStore    │      │   over a transport seam)     │
//! │  - Event ─► QueueBackend     │      └──────────────┬───────────────┘
//! │  - Watch ─► QueueBackend     │                     │
//! └──────┬──────────────┬────────┘                     ▼
//!        ▼              ▼                     authoritative node
//!   append-only     per-queue fan-out
//!   logs            (independent bounded
//!                    watcher queues)
//! ```
//!
//! ## Behavior highlights
//! - **Per-path exclusive writes**: concurrent appends to one log are
//!   serialized; each batch lands contiguously. Unrelated logs never block
//!   each other.
//! - **Plain vs event**: classification is a static property of the
//!   artifact definition. Plain destinations append to a stable path; event
//!   destinations delegate to the queue backend, which owns partitioning
//!   and fan-out.
//! - **Tolerated absences**: "no journal installed" and "journal without a
//!   backend" are explicit, valid states — watches return an idle handle
//!   that pends until cancelled, writes fail loudly with
//!   [`JournalError::BackendUnavailable`].
//! - **Master/minion**: the role decision happens once, at
//!   [`broker::lifecycle::start`]; minions install a forwarding stub, and a
//!   stub that cannot reach the master degrades to local-only operation.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use rowjournal::{
//!     ArtifactCatalog, ArtifactDefinition, JournalConfig, JournalDeps, JournalSlot,
//!     MemoryStore, Row, broker::lifecycle,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = Arc::new(ArtifactCatalog::new());
//!     catalog.register(ArtifactDefinition::event("Server.Monitor.Health"));
//!
//!     let config = JournalConfig::default();
//!     let store = MemoryStore::from_config(&config);
//!     let slot = Arc::new(JournalSlot::new());
//!     let shutdown = CancellationToken::new();
//!
//!     lifecycle::start(
//!         &config,
//!         JournalDeps {
//!             resolver: catalog,
//!             store: Arc::new(store.clone()),
//!             backend: Some(Arc::new(store.clone())),
//!             transport: None,
//!         },
//!         &slot,
//!         shutdown.clone(),
//!     )
//!     .await;
//!
//!     // Consumer side: watch a queue.
//!     let watcher_token = CancellationToken::new();
//!     let mut sub = slot.watch("Server.Monitor.Health", watcher_token).await;
//!
//!     // Producer side: route rows to an event artifact.
//!     let rows = vec![Row::new().with("status", "ok")];
//!     slot.push_rows("Server.Monitor.Health", None, None, None, &rows).await?;
//!
//!     let row = sub.stream.recv().await.expect("row delivered");
//!     assert_eq!(row.get("status"), Some(&"ok".into()));
//!
//!     sub.cancel.cancel();
//!     shutdown.cancel();
//!     Ok(())
//! }
//! ```

pub mod broker;
mod config;
pub mod destinations;
mod error;
pub mod journal;
mod rows;
pub mod storage;

// ---- Public re-exports ----

pub use broker::{JournalBroker, JournalDeps, JournalSlot, PathLockTable, ReplicationJournal, ReplicationTransport};
pub use config::{JournalConfig, NodeRole};
pub use destinations::{ArtifactCatalog, ArtifactDefinition, Destination, DestinationKind, ResolveDestination};
pub use error::JournalError;
pub use journal::{Journal, JournalRef, WatchCancel, WatchHandle, WatchStream};
pub use rows::Row;
pub use storage::{AppendLog, AppendStore, MemoryStore, QueueBackend};
