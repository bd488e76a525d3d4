//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. When any dependency changes, the effect is scheduled to re-run.
//!
//! 3. Before re-running, the effect runs the cleanup its previous run
//!    returned, unsubscribes from every signal it read, and disposes the
//!    scope that owned anything created during the previous run. The new run
//!    then tracks its dependencies from scratch, so branches that are no
//!    longer taken stop triggering it.
//!
//! # Scheduling
//!
//! Effects run synchronously: a signal write re-runs its subscribers before
//! the setter returns, in subscription order. Inside [`batch`](super::batch)
//! the runs are queued and each affected effect runs once when the batch
//! ends.
//!
//! An effect whose own run triggers it again (it writes a signal it has
//! already read) does not recurse; the nested trigger is dropped.
//!
//! # Failure
//!
//! A panicking body propagates to whoever triggered the run. The context and
//! owner stacks are restored while unwinding and the effect keeps its body,
//! so a later trigger runs it again.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;
use tracing::{debug, trace};

use super::context::ReactiveContext;
use super::owner::{Owner, WeakOwner};
use super::subscriber::{Source, SourceId, SubscriberId};

/// Cleanup function returned by an effect body. Runs before the next run and
/// on disposal.
pub type Cleanup = Box<dyn FnOnce()>;

type EffectFn = Box<dyn FnMut() -> Option<Cleanup>>;

struct EffectInner {
    /// Identity used by signals to key their subscriber sets.
    subscriber_id: SubscriberId,

    /// The effect function. Taken out while it runs.
    body: RefCell<Option<EffectFn>>,

    /// Cleanup returned by the last run.
    cleanup: RefCell<Option<Cleanup>>,

    /// Sources read during the last run, in first-read order.
    dependencies: RefCell<SmallVec<[(SourceId, Weak<dyn Source>); 4]>>,

    /// Scope owning whatever the last run created.
    scope: RefCell<Option<Owner>>,

    /// The owner that was current when the effect was created.
    parent: Option<WeakOwner>,

    active: Cell<bool>,
    running: Cell<bool>,
    run_count: Cell<usize>,
}

/// A side-effecting computation that runs when dependencies change.
///
/// Cloning an `Effect` shares the computation.
///
/// # Example
///
/// ```rust
/// use olova_core::reactive::{Effect, Signal};
///
/// let count = Signal::new(0);
/// let reader = count.clone();
/// let effect = Effect::new(move || {
///     println!("Count is: {}", reader.get());
/// });
///
/// count.set(5); // Prints: "Count is: 5"
/// assert_eq!(effect.run_count(), 2);
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Rc<EffectInner>,
}

/// Restores the running flag and hands the body back, also on unwind.
struct RunGuard<'a> {
    effect: &'a EffectInner,
    body: Option<EffectFn>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.effect.running.set(false);
        if self.effect.active.get() {
            if let Some(body) = self.body.take() {
                *self.effect.body.borrow_mut() = Some(body);
            }
        }
    }
}

impl Effect {
    /// Create a new effect and run it immediately to establish its
    /// dependencies.
    pub fn new<F>(mut run: F) -> Self
    where
        F: FnMut() + 'static,
    {
        Self::with_cleanup(move || {
            run();
            None
        })
    }

    /// Create an effect whose body may return a cleanup function.
    pub fn with_cleanup<F>(run: F) -> Self
    where
        F: FnMut() -> Option<Cleanup> + 'static,
    {
        let effect = Self::new_lazy_with_cleanup(run);
        effect.execute();
        effect
    }

    /// Create a new effect without running it.
    pub fn new_lazy<F>(mut run: F) -> Self
    where
        F: FnMut() + 'static,
    {
        Self::new_lazy_with_cleanup(move || {
            run();
            None
        })
    }

    fn new_lazy_with_cleanup<F>(run: F) -> Self
    where
        F: FnMut() -> Option<Cleanup> + 'static,
    {
        let effect = Self::unscheduled();
        effect.set_body(Box::new(run));
        effect
    }

    /// An effect with no body yet, registered with the current owner.
    pub(crate) fn unscheduled() -> Self {
        let owner = Owner::current();
        let effect = Self {
            inner: Rc::new(EffectInner {
                subscriber_id: SubscriberId::new(),
                body: RefCell::new(None),
                cleanup: RefCell::new(None),
                dependencies: RefCell::new(SmallVec::new()),
                scope: RefCell::new(None),
                parent: owner.as_ref().map(Owner::downgrade),
                active: Cell::new(true),
                running: Cell::new(false),
                run_count: Cell::new(0),
            }),
        };
        if let Some(owner) = owner {
            owner.own_effect(effect.clone());
        }
        effect
    }

    pub(crate) fn set_body(&self, body: Box<dyn FnMut() -> Option<Cleanup>>) {
        if self.is_active() {
            *self.inner.body.borrow_mut() = Some(body);
        }
    }

    /// Get the subscriber ID for this effect.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.inner.subscriber_id
    }

    /// Execute the effect function.
    ///
    /// Runs the previous cleanup, drops the previous dependencies and scope,
    /// then runs the body within a reactive context to track dependencies.
    pub fn execute(&self) {
        if !self.is_active() {
            return;
        }
        if self.inner.running.replace(true) {
            debug!(
                effect = ?self.inner.subscriber_id,
                "effect triggered during its own run; skipping"
            );
            return;
        }

        let mut guard = RunGuard {
            effect: &self.inner,
            body: self.inner.body.borrow_mut().take(),
        };

        let cleanup = self.run_tracked(|| guard.body.as_mut().and_then(|body| body()));
        drop(guard);

        if self.is_active() {
            *self.inner.cleanup.borrow_mut() = cleanup;
        } else if let Some(cleanup) = cleanup {
            // Disposed during its own run.
            cleanup();
        }

        self.mount_scope_if_attached();
    }

    /// Run `f` as this effect's next run: reset, then track what `f` reads.
    pub(crate) fn run_tracked<R>(&self, f: impl FnOnce() -> R) -> R {
        self.reset();

        let scope = Owner::new();
        *self.inner.scope.borrow_mut() = Some(scope.clone());

        trace!(effect = ?self.inner.subscriber_id, run = self.run_count() + 1, "running effect");

        let result = {
            let _owner = scope.enter();
            let _ctx = ReactiveContext::enter(self.clone());
            f()
        };

        self.inner.run_count.set(self.inner.run_count.get() + 1);
        result
    }

    /// Re-runs inside an already mounted tree mount what they created.
    fn mount_scope_if_attached(&self) {
        let parent_mounted = self
            .inner
            .parent
            .as_ref()
            .and_then(WeakOwner::upgrade)
            .is_some_and(|owner| owner.is_mounted());
        if parent_mounted {
            if let Some(scope) = self.run_scope() {
                scope.mount();
            }
        }
    }

    /// Run the previous cleanup, unsubscribe, and dispose the previous scope.
    fn reset(&self) {
        let cleanup = self.inner.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }

        self.clear_dependencies();

        let scope = self.inner.scope.borrow_mut().take();
        if let Some(scope) = scope {
            scope.dispose();
        }
    }

    fn clear_dependencies(&self) {
        let dependencies = std::mem::take(&mut *self.inner.dependencies.borrow_mut());
        for (_, source) in dependencies {
            if let Some(source) = source.upgrade() {
                source.unsubscribe(self.inner.subscriber_id);
            }
        }
    }

    /// Record a dependency read during the current run.
    pub(crate) fn add_dependency(&self, id: SourceId, source: Weak<dyn Source>) {
        let mut dependencies = self.inner.dependencies.borrow_mut();
        if !dependencies.iter().any(|(existing, _)| *existing == id) {
            dependencies.push((id, source));
        }
    }

    /// The scope that owns what the last run created.
    pub(crate) fn run_scope(&self) -> Option<Owner> {
        self.inner.scope.borrow().clone()
    }

    /// Schedule the effect to re-run.
    ///
    /// Called when a dependency changes.
    pub fn schedule(&self) {
        if self.is_active() {
            self.execute();
        }
    }

    /// Whether the body is executing right now.
    pub(crate) fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Dispose of the effect.
    ///
    /// Runs the pending cleanup once, unsubscribes from every dependency and
    /// disposes whatever the last run created. Disposing twice is a no-op.
    pub fn dispose(&self) {
        if !self.inner.active.replace(false) {
            return;
        }
        debug!(effect = ?self.inner.subscriber_id, "disposing effect");

        let cleanup = self.inner.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }

        self.clear_dependencies();

        let scope = self.inner.scope.borrow_mut().take();
        if let Some(scope) = scope {
            scope.dispose();
        }

        // Drop the body so captured signals are released.
        let body = self.inner.body.borrow_mut().take();
        drop(body);
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        !self.is_active()
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Get the number of dependencies.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.borrow().len()
    }

    /// IDs of the sources read during the last run, in first-read order.
    pub fn dependencies(&self) -> Vec<SourceId> {
        self.inner
            .dependencies
            .borrow()
            .iter()
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn ptr_eq(&self, other: &Effect) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.subscriber_id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Create an effect that runs now and again whenever what it read changes.
///
/// The effect lives as long as the current owner (or as long as a signal it
/// reads, when created outside any owner).
pub fn set_effect<F>(body: F)
where
    F: FnMut() + 'static,
{
    Effect::new(body);
}

/// Like [`set_effect`], with a body that returns a cleanup function. The
/// cleanup runs before the next run and when the effect is disposed.
pub fn set_effect_with_cleanup<F, C>(mut body: F)
where
    F: FnMut() -> C + 'static,
    C: FnOnce() + 'static,
{
    Effect::with_cleanup(move || Some(Box::new(body()) as Cleanup));
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Signal;

    #[test]
    fn effect_runs_on_creation() {
        let run_count = Rc::new(Cell::new(0));
        let run_count_clone = run_count.clone();

        let _effect = Effect::new(move || {
            run_count_clone.set(run_count_clone.get() + 1);
        });

        assert_eq!(run_count.get(), 1);
    }

    #[test]
    fn effect_lazy_does_not_run_on_creation() {
        let run_count = Rc::new(Cell::new(0));
        let run_count_clone = run_count.clone();

        let effect = Effect::new_lazy(move || {
            run_count_clone.set(run_count_clone.get() + 1);
        });

        assert_eq!(run_count.get(), 0);
        assert_eq!(effect.run_count(), 0);

        effect.execute();
        assert_eq!(run_count.get(), 1);
        assert_eq!(effect.run_count(), 1);
    }

    #[test]
    fn effect_does_not_run_after_disposal() {
        let run_count = Rc::new(Cell::new(0));
        let run_count_clone = run_count.clone();

        let effect = Effect::new(move || {
            run_count_clone.set(run_count_clone.get() + 1);
        });
        assert_eq!(run_count.get(), 1);

        effect.dispose();
        assert!(effect.is_disposed());

        effect.schedule();
        effect.execute();
        assert_eq!(run_count.get(), 1);
    }

    #[test]
    fn dependencies_match_signals_read() {
        let a = Signal::new(1);
        let b = Signal::new(2);
        let unread = Signal::new(3);

        let (a2, b2) = (a.clone(), b.clone());
        let effect = Effect::new(move || {
            let _ = a2.get() + b2.get() + a2.get();
        });

        assert_eq!(effect.dependencies(), vec![a.id(), b.id()]);
        assert_eq!(unread.subscriber_count(), 0);
    }

    #[test]
    fn rerun_drops_branches_no_longer_taken() {
        let flag = Signal::new(true);
        let left = Signal::new("left");
        let right = Signal::new("right");
        let runs = Rc::new(Cell::new(0));

        let (f, l, r, n) = (flag.clone(), left.clone(), right.clone(), runs.clone());
        let effect = Effect::new(move || {
            n.set(n.get() + 1);
            if f.get() {
                let _ = l.get();
            } else {
                let _ = r.get();
            }
        });
        assert_eq!(left.subscriber_count(), 1);
        assert_eq!(right.subscriber_count(), 0);

        flag.set(false);
        assert_eq!(runs.get(), 2);
        assert_eq!(left.subscriber_count(), 0);
        assert_eq!(right.subscriber_count(), 1);

        left.set("ignored");
        assert_eq!(runs.get(), 2);
        assert_eq!(effect.dependency_count(), 2);
    }

    #[test]
    fn cleanup_runs_before_rerun_and_on_dispose() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let count = Signal::new(0);

        let (c, l) = (count.clone(), log.clone());
        let effect = Effect::with_cleanup(move || {
            let value = c.get();
            l.borrow_mut().push(format!("run {value}"));
            let l = l.clone();
            Some(Box::new(move || l.borrow_mut().push(format!("cleanup {value}"))) as Cleanup)
        });

        count.set(1);
        effect.dispose();
        effect.dispose();

        assert_eq!(
            *log.borrow(),
            vec!["run 0", "cleanup 0", "run 1", "cleanup 1"]
        );
    }

    #[test]
    fn dispose_unsubscribes_from_every_signal() {
        let a = Signal::new(0);
        let b = Signal::new(0);
        let (a2, b2) = (a.clone(), b.clone());
        let effect = Effect::new(move || {
            let _ = a2.get() + b2.get();
        });

        assert_eq!(a.subscriber_count(), 1);
        effect.dispose();
        assert_eq!(a.subscriber_count(), 0);
        assert_eq!(b.subscriber_count(), 0);
    }

    #[test]
    fn self_triggering_effect_does_not_recurse() {
        let count = Signal::new(0);
        let c = count.clone();
        let effect = Effect::new(move || {
            let value = c.get();
            if value < 10 {
                c.set(value + 1);
            }
        });

        assert_eq!(effect.run_count(), 1);
        assert_eq!(count.get_untracked(), 1);
    }

    #[test]
    fn panicking_body_keeps_effect_usable() {
        let count = Signal::new(0);
        let c = count.clone();
        let effect = Effect::new(move || {
            if c.get() == 1 {
                panic!("bad value");
            }
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| count.set(1)));
        assert!(result.is_err());
        assert_eq!(ReactiveContext::depth(), 0);

        // The panicked run is not counted.
        count.set(2);
        assert_eq!(effect.run_count(), 2);
    }

    #[test]
    fn nested_effects_are_disposed_on_rerun() {
        let outer_trigger = Signal::new(0);
        let inner_signal = Signal::new(0);
        let inner_runs = Rc::new(Cell::new(0));

        let (t, s, n) = (outer_trigger.clone(), inner_signal.clone(), inner_runs.clone());
        let _outer = Effect::new(move || {
            let _ = t.get();
            let (s, n) = (s.clone(), n.clone());
            Effect::new(move || {
                let _ = s.get();
                n.set(n.get() + 1);
            });
        });
        assert_eq!(inner_runs.get(), 1);

        outer_trigger.set(1);
        assert_eq!(inner_runs.get(), 2);

        // Only the inner effect from the latest outer run is subscribed.
        inner_signal.set(1);
        assert_eq!(inner_runs.get(), 3);
        assert_eq!(inner_signal.subscriber_count(), 1);
    }
}
