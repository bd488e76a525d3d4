//! Memo Implementation
//!
//! A Memo is a cached derived value. It is built from two parts:
//!
//! - a cache [`Signal`] that consumers read, and
//! - an internal [`Effect`] that recomputes the value whenever one of its
//!   dependencies changes and writes it into the cache.
//!
//! Consumers subscribe to the cache, never to the memo's own dependencies,
//! so the computation runs once per dependency change no matter how often
//! the value is read in between.
//!
//! When a recomputation produces a value equal to the cached one, the cache
//! is left untouched and consumers are not notified.

use std::fmt::Debug;

use super::effect::Effect;
use super::signal::Signal;
use super::subscriber::SourceId;

/// A cached derived value that recomputes only when dependencies change.
///
/// # Type Parameters
///
/// - `T`: The type of the computed value. `PartialEq` is needed to detect
///   when a recomputation actually changed the value.
pub struct Memo<T> {
    cache: Signal<T>,
    effect: Effect,
}

impl<T> Memo<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a memo and compute its first value immediately.
    pub fn new<F>(mut compute: F) -> Self
    where
        F: FnMut() -> T + 'static,
    {
        let effect = Effect::unscheduled();
        let initial = effect.run_tracked(&mut compute);
        let cache = Signal::new(initial);

        let writer = cache.clone();
        effect.set_body(Box::new(move || {
            let value = compute();
            writer.set_if_changed(value);
            None
        }));

        Self { cache, effect }
    }

    /// Get the cached value; subscribes the running computation to the
    /// cache.
    pub fn get(&self) -> T {
        self.cache.get()
    }

    pub fn get_untracked(&self) -> T {
        self.cache.get_untracked()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.cache.with(f)
    }

    /// ID of the cache signal consumers subscribe to.
    pub fn id(&self) -> SourceId {
        self.cache.id()
    }

    /// Number of times the computation has run.
    pub fn compute_count(&self) -> usize {
        self.effect.run_count()
    }

    /// Number of computations subscribed to this memo.
    pub fn subscriber_count(&self) -> usize {
        self.cache.subscriber_count()
    }

    /// Stop recomputing. The last value stays readable.
    pub fn dispose(&self) {
        self.effect.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.effect.is_disposed()
    }
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            effect: self.effect.clone(),
        }
    }
}

impl<T: Debug + 'static> Debug for Memo<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("cache", &self.cache)
            .field("compute_count", &self.effect.run_count())
            .field("disposed", &self.effect.is_disposed())
            .finish()
    }
}

/// Create a memoized value from `compute`.
///
/// ```rust
/// use olova_core::{set_memo, set_signal};
///
/// let (a, set_a) = set_signal(1);
/// let doubled = set_memo(move || a.get() * 2);
/// set_a.set(4);
/// assert_eq!(doubled.get(), 8);
/// ```
pub fn set_memo<T, F>(compute: F) -> Memo<T>
where
    T: Clone + PartialEq + 'static,
    F: FnMut() -> T + 'static,
{
    Memo::new(compute)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
