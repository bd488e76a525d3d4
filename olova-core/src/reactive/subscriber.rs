//! Identifiers shared by the reactive primitives.
//!
//! A subscriber is any computation that depends on reactive values (effects,
//! memo internals, reactive children). A source is anything a subscriber can
//! depend on; today that is only [`Signal`](super::Signal).

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a subscriber.
///
/// Each subscriber gets a unique ID when created. Signals key their
/// subscriber sets by it, so re-reading a signal within one run does not
/// subscribe twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a source (a signal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

/// The subscriber-facing side of a source.
///
/// Effects hold their dependencies as `Weak<dyn Source>` so that a source is
/// never kept alive by the computations reading it.
pub(crate) trait Source {
    fn source_id(&self) -> SourceId;

    /// Drop the subscription of the given subscriber. Unknown IDs are ignored.
    fn unsubscribe(&self, subscriber: SubscriberId);
}
