//! # The `Journal` capability trait.
//!
//! Both the local broker and the replication stub implement this contract;
//! the lifecycle installs one of them into the
//! [`JournalSlot`](crate::broker::JournalSlot) at startup.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::JournalError;
use crate::journal::WatchHandle;
use crate::rows::Row;
use crate::storage::QueueBackend;

/// Shared handle to the current journal implementation.
pub type JournalRef = Arc<dyn Journal>;

/// # The journal contract: write, route, watch.
///
/// ## Contract
/// - `append` and `push_rows` never swallow a failure: a failed write always
///   returns an error to its caller. Neither retries.
/// - `watch` never fails: when the journal has no backend it returns an idle
///   handle whose stream pends (not closed) until cancelled, so callers can
///   block in a select without special-casing "journal disabled".
/// - Rows delivered to a watcher preserve the write order of its queue; no
///   ordering is guaranteed across different queues.
#[async_trait]
pub trait Journal: Send + Sync + 'static {
    /// Appends `rows`, in order, to the plain log at `path`.
    ///
    /// Bypasses artifact resolution; use when the path is already known.
    /// Concurrent appends to the same path are serialized; appends to
    /// unrelated paths proceed in parallel.
    async fn append(&self, path: &str, rows: &[Row]) -> Result<(), JournalError>;

    /// Routes `rows` to the destination resolved from the artifact spec.
    ///
    /// This is the sole entry point external producers should use. Plain
    /// destinations go through [`Journal::append`]; event destinations are
    /// delegated wholesale to the queue backend.
    ///
    /// # Errors
    /// - [`JournalError::Resolution`] when the artifact/source pair cannot
    ///   be mapped to a path.
    /// - [`JournalError::BackendUnavailable`] for event destinations when no
    ///   backend is configured.
    /// - [`JournalError::Storage`] when the append log fails.
    async fn push_rows(
        &self,
        artifact: &str,
        source: Option<&str>,
        client_id: Option<&str>,
        flow_id: Option<&str>,
        rows: &[Row],
    ) -> Result<(), JournalError>;

    /// Subscribes to rows written to `queue_name` after this call.
    ///
    /// No history is replayed. Delivery stops when the returned handle is
    /// cancelled or `token` fires, whichever comes first.
    async fn watch(&self, queue_name: &str, token: CancellationToken) -> WatchHandle;

    /// The backend capability this journal holds, if any.
    ///
    /// Used by the lifecycle to carry a live backend across a hot-swap.
    /// Forwarding implementations hold none.
    fn queue_backend(&self) -> Option<Arc<dyn QueueBackend>> {
        None
    }
}
