//! # Queue backend seam.
//!
//! The queue backend is the pluggable subsystem behind event destinations:
//! it performs the durable, time-partitioned writes, fans rows out to live
//! watchers, and handles any cross-node replication wiring. A broker holds
//! at most one backend, and may hold none — event writes then fail with
//! [`BackendUnavailable`](crate::JournalError::BackendUnavailable) and
//! watches degrade to idle handles.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::destinations::Destination;
use crate::error::JournalError;
use crate::journal::WatchHandle;
use crate::rows::Row;

/// # Event stream backend: durable writes plus subscriber delivery.
///
/// ## Contract
/// - [`QueueBackend::push_event_rows`] owns partitioning, replication and
///   any locking for the event stream; the broker delegates the entire
///   batch and returns the result unmodified.
/// - [`QueueBackend::watch`] registers an independent subscriber: many may
///   watch one queue name; each receives every row written after its own
///   subscribe time, in write order; cancelling one never affects another.
/// - Subscriber resources are released when the handle is cancelled or the
///   caller's token fires, whichever comes first.
#[async_trait]
pub trait QueueBackend: Send + Sync + 'static {
    /// Subscribes to rows written to `queue_name` after this call.
    async fn watch(&self, queue_name: &str, token: CancellationToken) -> WatchHandle;

    /// Durably writes an event batch, then notifies watchers of the queue.
    async fn push_event_rows(
        &self,
        destination: &Destination,
        rows: &[Row],
    ) -> Result<(), JournalError>;
}
