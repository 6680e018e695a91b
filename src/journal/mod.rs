//! The journal contract: one capability interface, two implementations.
//!
//! [`Journal`] is the public surface producers and consumers program
//! against. The authoritative node installs the local
//! [`JournalBroker`](crate::broker::JournalBroker); minions install the
//! forwarding [`ReplicationJournal`](crate::broker::ReplicationJournal).
//! Role dispatch happens once at startup — callers never branch on role.
//!
//! ## Contents
//! - [`Journal`], [`JournalRef`] — the contract and its shared handle
//! - [`WatchHandle`], [`WatchStream`], [`WatchCancel`] — live delivery

mod contract;
mod watch;

pub use contract::{Journal, JournalRef};
pub use watch::{WatchCancel, WatchHandle, WatchStream};
