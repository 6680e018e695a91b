//! Broker core: routing, per-path locking, replication, lifecycle.
//!
//! This module contains both implementations of the journal contract and
//! the machinery that selects between them:
//! - [`JournalBroker`]: the authoritative, local implementation;
//! - [`ReplicationJournal`]: the minion-side forwarding stub;
//! - [`PathLockTable`]: per-path exclusive-write discipline;
//! - [`JournalSlot`]: the swappable "current journal" handle;
//! - [`lifecycle`]: role dispatch, hot-swap carry-over, shutdown.

mod core;
pub mod lifecycle;
mod locks;
mod replication;
mod slot;

pub use self::core::JournalBroker;
pub use lifecycle::JournalDeps;
pub use locks::PathLockTable;
pub use replication::{ReplicationJournal, ReplicationTransport};
pub use slot::JournalSlot;
