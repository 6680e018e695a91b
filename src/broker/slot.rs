//! # JournalSlot: the process-wide "current journal" handle.
//!
//! A single owner of "the current implementation of the journal contract",
//! replaceable at runtime. The slot is an explicit value the embedding
//! process owns and passes to subsystems — not an ambient global.
//!
//! ## Rules
//! - Swaps are atomic: a concurrent reader observes either the old, fully
//!   functional instance or the new one, never a half-built one.
//! - In-flight operations hold an `Arc` to the instance they started on, so
//!   an operation racing a swap completes against the old instance; the old
//!   instance (and its backend) drops when the last such caller finishes.
//! - An empty slot is a tolerated state: watches degrade to idle handles,
//!   writes fail loudly.

use std::sync::RwLock;

use tokio_util::sync::CancellationToken;

use crate::error::JournalError;
use crate::journal::{JournalRef, WatchHandle};
use crate::rows::Row;

/// Swappable handle to the current journal implementation.
#[derive(Default)]
pub struct JournalSlot {
    inner: RwLock<Option<JournalRef>>,
}

impl JournalSlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current journal, if one is installed.
    pub fn current(&self) -> Option<JournalRef> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Installs a new journal, replacing any previous one atomically.
    ///
    /// Returns the instance that was displaced, if any.
    pub fn install(&self, journal: JournalRef) -> Option<JournalRef> {
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        slot.replace(journal)
    }

    /// Empties the slot (shutdown / deregistration).
    pub fn clear(&self) -> Option<JournalRef> {
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        slot.take()
    }

    /// True when no journal is installed.
    pub fn is_empty(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }

    /// Appends rows via the current journal.
    ///
    /// # Errors
    /// [`JournalError::BackendUnavailable`] when no journal is installed
    /// (the process runs with journaling disabled), plus any error from the
    /// journal itself.
    pub async fn append(&self, path: &str, rows: &[Row]) -> Result<(), JournalError> {
        match self.current() {
            Some(journal) => journal.append(path, rows).await,
            None => Err(JournalError::BackendUnavailable),
        }
    }

    /// Routes rows via the current journal.
    ///
    /// # Errors
    /// [`JournalError::BackendUnavailable`] when no journal is installed,
    /// plus any error from the journal itself.
    pub async fn push_rows(
        &self,
        artifact: &str,
        source: Option<&str>,
        client_id: Option<&str>,
        flow_id: Option<&str>,
        rows: &[Row],
    ) -> Result<(), JournalError> {
        match self.current() {
            Some(journal) => {
                journal
                    .push_rows(artifact, source, client_id, flow_id, rows)
                    .await
            }
            None => Err(JournalError::BackendUnavailable),
        }
    }

    /// Watches a queue via the current journal.
    ///
    /// With no journal installed this returns an idle handle — the caller
    /// blocks as if waiting for events that may never come, without
    /// special-casing "journal disabled".
    pub async fn watch(&self, queue_name: &str, token: CancellationToken) -> WatchHandle {
        match self.current() {
            Some(journal) => journal.watch(queue_name, token).await,
            None => WatchHandle::idle(&token),
        }
    }
}
