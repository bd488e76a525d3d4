//! Reactive Runtime
//!
//! The runtime decides when notified effects run.
//!
//! # Policy
//!
//! Outside a batch, notification is immediate: a signal write runs each
//! subscriber synchronously, in subscription order, before the setter
//! returns. Two writes in a row therefore run a shared subscriber twice.
//!
//! Inside [`batch`], notified effects are queued instead. The queue keeps
//! the first-notified order and holds each effect once; when the outermost
//! batch exits the queue is drained and every queued effect runs a single
//! time, seeing the final values of everything written in the batch. The
//! drain itself keeps the batch open, so writes made by a draining effect
//! join the queue rather than running their subscribers on the spot. An
//! effect is never queued while its own body is running.
//!
//! # Diamonds
//!
//! An effect that reads both a signal and a memo derived from it sits at
//! the bottom of a diamond. Under the immediate policy a single write runs
//! it twice: once when the memo recomputes and writes its cache, and once
//! more from the signal's own subscriber list. The first of those runs
//! already sees the new values of both. Wrap the write in [`batch`] to run
//! it once.

use std::cell::RefCell;

use indexmap::IndexMap;
use tracing::debug;

use super::context::ReactiveContext;
use super::effect::Effect;
use super::subscriber::SubscriberId;

#[derive(Default)]
struct BatchState {
    depth: usize,
    pending: IndexMap<SubscriberId, Effect>,
}

thread_local! {
    static BATCH: RefCell<BatchState> = RefCell::new(BatchState::default());
}

/// Entry points of the scheduler.
pub struct Runtime;

impl Runtime {
    /// Run or queue the given subscribers of a changed signal.
    pub(crate) fn notify(subscribers: Vec<Effect>) {
        let queued = BATCH.with(|batch| {
            let mut batch = batch.borrow_mut();
            if batch.depth == 0 {
                return false;
            }
            for effect in subscribers.iter().filter(|effect| !effect.is_running()) {
                batch
                    .pending
                    .entry(effect.subscriber_id())
                    .or_insert_with(|| effect.clone());
            }
            true
        });

        if queued {
            return;
        }

        for effect in subscribers {
            effect.schedule();
        }
    }

    /// Whether a batch is open on this thread.
    pub fn is_batching() -> bool {
        BATCH.with(|batch| batch.borrow().depth > 0)
    }

    /// Number of effects waiting for the current batch to end.
    pub fn pending_count() -> usize {
        BATCH.with(|batch| batch.borrow().pending.len())
    }

    /// Check if we're inside a tracking context.
    pub fn is_tracking() -> bool {
        ReactiveContext::is_active()
    }

    /// Get the current subscriber being tracked, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        ReactiveContext::current_subscriber()
    }

    /// Run queued effects in queue order until the queue is empty.
    fn flush() {
        let count = Self::pending_count();
        if count == 0 {
            return;
        }
        debug!(count, "flushing batched effects");

        BATCH.with(|batch| batch.borrow_mut().depth += 1);
        let _guard = BatchGuard;
        while let Some((_, effect)) =
            BATCH.with(|batch| batch.borrow_mut().pending.shift_remove_index(0))
        {
            effect.schedule();
        }
    }
}

struct BatchGuard;

impl Drop for BatchGuard {
    fn drop(&mut self) {
        let depth = BATCH.with(|batch| {
            let mut batch = batch.borrow_mut();
            batch.depth -= 1;
            if std::thread::panicking() && batch.depth == 0 {
                batch.pending.clear();
            }
            batch.depth
        });

        if depth == 0 && !std::thread::panicking() {
            Runtime::flush();
        }
    }
}

/// Coalesce the effect runs caused by every write inside `f`.
///
/// ```rust
/// use olova_core::{batch, set_effect, set_signal};
/// use std::{cell::RefCell, rc::Rc};
///
/// let (count, set_count) = set_signal(0);
/// let log = Rc::new(RefCell::new(Vec::new()));
/// let l = log.clone();
/// set_effect(move || l.borrow_mut().push(count.get()));
///
/// batch(|| {
///     set_count.set(1);
///     set_count.set(2);
/// });
/// assert_eq!(*log.borrow(), vec![0, 2]);
/// ```
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    BATCH.with(|batch| batch.borrow_mut().depth += 1);
    let _guard = BatchGuard;
    f()
}
