//! Error types surfaced by the journal broker.
//!
//! All fallible journal operations return [`JournalError`]. The taxonomy is
//! deliberately small:
//!
//! - [`JournalError::Resolution`] — the caller named an artifact the resolver
//!   does not know, or omitted identifiers the artifact requires.
//! - [`JournalError::Storage`] — the append log could not be opened or failed
//!   mid-write.
//! - [`JournalError::BackendUnavailable`] — no queue backend is configured.
//!   This is an expected state (a process may run with journaling disabled),
//!   not a fatal one.
//! - [`JournalError::Replication`] — a forwarded operation failed on the
//!   authoritative node or in transit.
//!
//! The broker never swallows a write failure and never retries; retry policy
//! belongs to the caller. `watch` never returns an error at all — the
//! "backend absent" case is represented structurally by an idle
//! [`WatchHandle`](crate::journal::WatchHandle).

use thiserror::Error;

/// # Errors produced by journal operations.
///
/// Each variant carries enough context to log the failure without consulting
/// the call site. Use [`JournalError::as_label`] for stable log/metric keys.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JournalError {
    /// The destination could not be resolved to a path and kind.
    ///
    /// The request is malformed or references an unknown artifact; the
    /// broker surfaces this immediately and never retries.
    #[error("cannot resolve destination for artifact {artifact:?}: {reason}")]
    Resolution {
        /// Artifact name (with optional `/source` suffix) as given by the caller.
        artifact: String,
        /// Why resolution failed.
        reason: String,
    },

    /// The append log could not be opened, or a write failed mid-batch.
    ///
    /// The per-path lock is released and the appender closed before this is
    /// returned, so a retry by the caller starts from a clean state.
    #[error("storage failure on {path:?}: {reason}")]
    Storage {
        /// Canonical path of the destination log.
        path: String,
        /// Underlying failure description.
        reason: String,
    },

    /// No queue backend capability is configured.
    ///
    /// Returned by event-kind writes when the process runs without a storage
    /// subsystem. Expected and recoverable at the system level; callers must
    /// treat it as data-loss-relevant and report it, not ignore it.
    #[error("no queue backend configured")]
    BackendUnavailable,

    /// A forwarded operation failed (minion → authoritative node).
    ///
    /// Remote failures are surfaced exactly as local ones would be; the
    /// replication stub never masks them as success.
    #[error("replication transport failure: {reason}")]
    Replication {
        /// Transport or remote-side failure description.
        reason: String,
    },
}

impl JournalError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use rowjournal::JournalError;
    ///
    /// assert_eq!(JournalError::BackendUnavailable.as_label(), "backend_unavailable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            JournalError::Resolution { .. } => "resolution_failed",
            JournalError::Storage { .. } => "storage_failed",
            JournalError::BackendUnavailable => "backend_unavailable",
            JournalError::Replication { .. } => "replication_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            JournalError::Resolution { artifact, reason } => {
                format!("resolution: artifact={artifact} reason={reason}")
            }
            JournalError::Storage { path, reason } => {
                format!("storage: path={path} reason={reason}")
            }
            JournalError::BackendUnavailable => "no queue backend configured".to_string(),
            JournalError::Replication { reason } => format!("replication: {reason}"),
        }
    }

    /// True when the failure means "this process has no queue backend".
    ///
    /// Useful for callers that want to degrade (e.g. skip journaling) rather
    /// than report every event write as an error.
    pub fn is_backend_missing(&self) -> bool {
        matches!(self, JournalError::BackendUnavailable)
    }

    /// Builds a [`JournalError::Storage`] from a path and any displayable cause.
    pub(crate) fn storage(path: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        JournalError::Storage {
            path: path.into(),
            reason: cause.to_string(),
        }
    }

    /// Builds a [`JournalError::Resolution`] from an artifact name and reason.
    pub(crate) fn resolution(artifact: impl Into<String>, reason: impl Into<String>) -> Self {
        JournalError::Resolution {
            artifact: artifact.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        let err = JournalError::resolution("Custom.Artifact", "unknown artifact");
        assert_eq!(err.as_label(), "resolution_failed");

        let err = JournalError::storage("clients/C.1/x", "disk full");
        assert_eq!(err.as_label(), "storage_failed");
        assert_eq!(
            JournalError::BackendUnavailable.as_label(),
            "backend_unavailable"
        );
    }

    #[test]
    fn test_backend_missing_predicate() {
        assert!(JournalError::BackendUnavailable.is_backend_missing());
        let remote = JournalError::Replication {
            reason: "down".into(),
        };
        assert!(!remote.is_backend_missing());
    }

    #[test]
    fn test_messages_carry_context() {
        let err = JournalError::storage("server_artifacts/X", "open failed");
        assert!(err.as_message().contains("server_artifacts/X"));
        assert!(err.to_string().contains("open failed"));
    }
}
