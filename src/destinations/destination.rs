//! Resolved destination: canonical path, queue name, and kind.

/// Kind of a destination, fixed by the artifact definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DestinationKind {
    /// Single cumulative log, appended to indefinitely at a stable path.
    Plain,
    /// Time-partitioned stream with live subscriber fan-out. The queue name
    /// is the subscription identity; partitioning under the path prefix is
    /// owned by the queue backend.
    Event,
}

/// A resolved write target.
///
/// Produced by a [`ResolveDestination`](crate::destinations::ResolveDestination)
/// implementation; consumed by the broker's routing logic. For plain
/// destinations `path` is the stable log path; for event destinations it is
/// the stream's path prefix and `queue_name` is the identity watchers
/// subscribe to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destination {
    /// Queue name used for subscriptions: `artifact` or `artifact/source`.
    pub queue_name: String,
    /// Canonical storage path (plain) or path prefix (event).
    pub path: String,
    /// Plain or event, per the artifact definition.
    pub kind: DestinationKind,
}

impl Destination {
    /// True for event-kind destinations.
    #[inline]
    pub fn is_event(&self) -> bool {
        matches!(self.kind, DestinationKind::Event)
    }
}
