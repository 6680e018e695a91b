//! Storage capability seams consumed by the broker.
//!
//! The broker owns no storage of its own. Plain writes go through an
//! [`AppendStore`], event writes and subscriptions through a
//! [`QueueBackend`]; both are opaque capabilities supplied at startup.
//! [`MemoryStore`] implements both in-process, for tests and for
//! deployments that run without a durable store.
//!
//! ## Contents
//! - [`AppendLog`], [`AppendStore`] — append-only log seam
//! - [`QueueBackend`] — event stream + fan-out seam
//! - [`MemoryStore`] — in-process reference implementation

mod append;
mod backend;
mod memory;

pub use append::{AppendLog, AppendStore};
pub use backend::QueueBackend;
pub use memory::MemoryStore;
