//! # Append-only log seam.
//!
//! The durable log format and its reader/writer live outside this crate;
//! the broker only needs "open for append, write rows, close". An appender
//! is obtained per write call and closed deterministically on every exit
//! path, including mid-batch failure.

use crate::error::JournalError;
use crate::rows::Row;

/// One open append session on a log.
///
/// ## Contract
/// - The log is opened in append mode; opening never truncates.
/// - [`AppendLog::close`] must be called exactly once per successful open —
///   the broker guarantees this even when a mid-batch write fails.
pub trait AppendLog: Send {
    /// Appends one row at the end of the log.
    fn write(&mut self, row: &Row) -> Result<(), JournalError>;

    /// Flushes and closes the log.
    fn close(self: Box<Self>) -> Result<(), JournalError>;
}

/// Factory for append sessions, keyed by canonical path.
pub trait AppendStore: Send + Sync {
    /// Opens the log at `path` for appending, creating it if absent.
    ///
    /// # Errors
    /// [`JournalError::Storage`] when the log cannot be opened.
    fn open_append(&self, path: &str) -> Result<Box<dyn AppendLog>, JournalError>;
}
