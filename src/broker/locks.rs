//! # Per-path lock table.
//!
//! Serializes appenders to one log within this process. The table hands out
//! exactly one lock object per canonical path string; the table's own mutex
//! protects only the map lookup/insert and is never held across a guarded
//! write.
//!
//! Entries are created lazily and never reclaimed: paths are finite in
//! practice (one per artifact/client/flow combination), and keeping the
//! entry preserves idempotent lock identity for the process lifetime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

/// Process-local table of per-path exclusive locks.
///
/// ## Contract
/// - [`PathLockTable::lock_for`] is idempotent: every call with the same
///   path string returns the same lock object, for the life of the process.
/// - Table acquisition is O(1) and short-lived; holders of a per-path lock
///   never block lookups for unrelated paths.
#[derive(Default)]
pub struct PathLockTable {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl PathLockTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the exclusive lock for `path`, creating it on first use.
    ///
    /// The caller locks the returned mutex around its append session; this
    /// method itself only touches the map.
    pub fn lock_for(&self, path: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        match locks.get(path) {
            Some(lock) => Arc::clone(lock),
            None => {
                let lock = Arc::new(AsyncMutex::new(()));
                locks.insert(path.to_string(), Arc::clone(&lock));
                lock
            }
        }
    }

    /// Number of distinct paths seen so far.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// True when no path has been locked yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
