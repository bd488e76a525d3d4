//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a reactive context (memo/effect), the
//!    signal registers that context as a subscriber.
//!
//! 2. When a signal's value changes, all subscribers are notified in the
//!    order they subscribed.
//!
//! 3. Notifications trigger re-execution of dependent computations.
//!
//! # Ownership
//!
//! Signals hold their subscribers strongly; effects hold the signals they
//! read weakly. A signal therefore keeps alive the effects that read it,
//! until they re-run without reading it or are disposed.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use tracing::trace;

use super::context::ReactiveContext;
use super::effect::Effect;
use super::runtime::Runtime;
use super::subscriber::{Source, SourceId, SubscriberId};

struct SignalInner<T> {
    id: SourceId,
    value: RefCell<T>,
    /// Insertion-ordered so notification follows subscription order.
    subscribers: RefCell<IndexMap<SubscriberId, Effect>>,
}

impl<T> Source for SignalInner<T> {
    fn source_id(&self) -> SourceId {
        self.id
    }

    fn unsubscribe(&self, subscriber: SubscriberId) {
        self.subscribers.borrow_mut().shift_remove(&subscriber);
    }
}

/// A reactive signal holding a value of type T.
///
/// Cloning a signal shares its value and subscribers.
///
/// # Example
///
/// ```rust
/// use olova_core::reactive::Signal;
///
/// let count = Signal::new(0);
/// assert_eq!(count.get(), 0);
///
/// count.set(5);
/// assert_eq!(count.update(|v| v + 1), 6);
/// ```
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T: 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                id: SourceId::new(),
                value: RefCell::new(value),
                subscribers: RefCell::new(IndexMap::new()),
            }),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> SourceId {
        self.inner.id
    }

    /// Subscribe the running computation, if there is one.
    fn track(&self) {
        let Some(effect) = ReactiveContext::current_effect() else {
            return;
        };

        let subscriber_id = effect.subscriber_id();
        if self.inner.subscribers.borrow().contains_key(&subscriber_id) {
            return;
        }

        trace!(signal = ?self.inner.id, subscriber = ?subscriber_id, "subscribing");
        let source: Weak<dyn Source> = Rc::downgrade(&self.inner) as Weak<dyn Source>;
        effect.add_dependency(self.inner.id, source);
        self.inner
            .subscribers
            .borrow_mut()
            .insert(subscriber_id, effect);
    }

    /// Borrow the current value.
    ///
    /// If called within a reactive context, this also registers the
    /// current computation as a subscriber.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.inner.value.borrow())
    }

    /// Borrow the current value without tracking.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Set a new value and notify subscribers.
    pub fn set(&self, value: T) {
        let previous = self.inner.value.replace(value);
        drop(previous);
        self.notify();
    }

    /// Store `value` and notify only if it differs from the current value.
    ///
    /// Returns whether subscribers were notified.
    pub fn set_if_changed(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        if *self.inner.value.borrow() == value {
            return false;
        }
        self.set(value);
        true
    }

    /// Notify all subscribers that the value has changed.
    pub fn notify(&self) {
        let subscribers: Vec<Effect> = self.inner.subscribers.borrow().values().cloned().collect();
        if subscribers.is_empty() {
            return;
        }
        trace!(signal = ?self.inner.id, count = subscribers.len(), "notifying subscribers");
        Runtime::notify(subscribers);
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Whether the given effect is currently subscribed.
    pub fn is_subscribed(&self, effect: &Effect) -> bool {
        self.inner
            .subscribers
            .borrow()
            .contains_key(&effect.subscriber_id())
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Get the current value.
    ///
    /// If called within a reactive context, this also registers the
    /// current computation as a subscriber.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.with_untracked(T::clone)
    }

    /// Update the value using a function of the current value.
    ///
    /// Returns the updated value.
    pub fn update<F>(&self, f: F) -> T
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.inner.value.borrow());
        self.set(next.clone());
        next
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug + 'static> Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Read / write halves
// ----------------------------------------------------------------------------

/// The getter half returned by [`set_signal`].
pub struct ReadSignal<T> {
    signal: Signal<T>,
}

/// The setter half returned by [`set_signal`].
pub struct WriteSignal<T> {
    signal: Signal<T>,
}

impl<T: Clone + 'static> ReadSignal<T> {
    /// Current value; subscribes the running computation.
    pub fn get(&self) -> T {
        self.signal.get()
    }

    pub fn get_untracked(&self) -> T {
        self.signal.get_untracked()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }

    pub fn id(&self) -> SourceId {
        self.signal.id()
    }

    pub fn subscriber_count(&self) -> usize {
        self.signal.subscriber_count()
    }
}

impl<T: Clone + 'static> WriteSignal<T> {
    /// Store `value`, notify subscribers and return the stored value.
    pub fn set(&self, value: T) -> T {
        self.signal.set(value.clone());
        value
    }

    /// Apply `f` to the current value, store the result, notify
    /// subscribers and return the stored value.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> T {
        self.signal.update(f)
    }
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
        }
    }
}

impl<T> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
        }
    }
}

impl<T: Debug + 'static> Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ReadSignal").field(&self.signal).finish()
    }
}

impl<T: Debug + 'static> Debug for WriteSignal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("WriteSignal").field(&self.signal).finish()
    }
}

/// Create a signal and return its getter and setter.
///
/// ```rust
/// use olova_core::set_signal;
///
/// let (count, set_count) = set_signal(0);
/// set_count.update(|n| n + 1);
/// assert_eq!(count.get(), 1);
/// ```
pub fn set_signal<T: Clone + 'static>(initial: T) -> (ReadSignal<T>, WriteSignal<T>) {
    let signal = Signal::new(initial);
    (
        ReadSignal {
            signal: signal.clone(),
        },
        WriteSignal { signal },
    )
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
