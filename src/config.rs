//! # Journal runtime configuration.
//!
//! Provides [`JournalConfig`], the settings consumed by
//! [`lifecycle::start`](crate::broker::lifecycle::start) when the process
//! decides which journal implementation to install.
//!
//! ## Sentinel values
//! - `watch_capacity = 0` → treated as 1 (a watcher queue always has room
//!   for at least one row; clamped by [`JournalConfig::watch_capacity_clamped`]).

use serde::{Deserialize, Serialize};

/// Role of this process within the cluster.
///
/// The role is resolved once at startup and selects the journal
/// implementation: masters run the local [`JournalBroker`](crate::broker::JournalBroker),
/// minions run the forwarding [`ReplicationJournal`](crate::broker::ReplicationJournal)
/// when a transport is available.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    /// Authoritative node with local write authority over storage.
    #[default]
    Master,
    /// Non-authoritative node; journal traffic is forwarded to the master.
    Minion,
}

impl NodeRole {
    /// True for the authoritative node.
    #[inline]
    pub fn is_master(&self) -> bool {
        matches!(self, NodeRole::Master)
    }
}

/// Configuration for the journal subsystem.
///
/// ## Field semantics
/// - `role`: cluster role of this process (`Master` = local writes,
///   `Minion` = forward everything to the authoritative node)
/// - `watch_capacity`: per-watcher delivery queue bound (min 1; clamped)
///
/// The broker imposes no timeouts of its own; I/O deadlines belong to the
/// append store and queue backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Cluster role resolved at startup.
    pub role: NodeRole,

    /// Capacity of each watcher's bounded delivery queue.
    ///
    /// A watcher that falls behind by more than this many rows starts
    /// dropping rows (with a warning); other watchers are unaffected.
    pub watch_capacity: usize,
}

impl JournalConfig {
    /// Returns the watch queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn watch_capacity_clamped(&self) -> usize {
        self.watch_capacity.max(1)
    }
}

impl Default for JournalConfig {
    /// Default configuration:
    ///
    /// - `role = Master` (single-node deployments are authoritative)
    /// - `watch_capacity = 1024`
    fn default() -> Self {
        Self {
            role: NodeRole::Master,
            watch_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_capacity_clamped() {
        let mut cfg = JournalConfig::default();
        cfg.watch_capacity = 0;
        assert_eq!(cfg.watch_capacity_clamped(), 1);
        cfg.watch_capacity = 64;
        assert_eq!(cfg.watch_capacity_clamped(), 64);
    }

    #[test]
    fn test_default_role_is_master() {
        assert!(JournalConfig::default().role.is_master());
    }
}
