//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a signal is read,
//! the current computation is subscribed to it.
//!
//! # Implementation
//!
//! We use a thread-local stack of frames. Running an effect pushes a
//! tracking frame for it; [`untrack`] pushes a frame that suppresses
//! tracking. Frames are popped by the guard returned from `enter`, so the
//! stack stays balanced when a body returns early or unwinds.
//!
//! Nested frames are the normal case: an effect that creates a memo runs the
//! memo's first computation inside its own frame.

use std::cell::RefCell;

use super::effect::Effect;
use super::SubscriberId;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// An entry in the reactive context stack.
#[derive(Clone)]
enum Frame {
    /// Reads subscribe this effect.
    Tracking(Effect),
    /// Reads do not subscribe anything.
    Untracked,
}

impl Frame {
    fn subscriber_id(&self) -> Option<SubscriberId> {
        match self {
            Frame::Tracking(effect) => Some(effect.subscriber_id()),
            Frame::Untracked => None,
        }
    }
}

/// Guard that pops the context when dropped.
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
}

impl ReactiveContext {
    /// Enter a tracking frame for the given effect.
    ///
    /// While the guard is alive, any signal that is read subscribes the
    /// effect.
    pub(crate) fn enter(effect: Effect) -> Self {
        let subscriber_id = Some(effect.subscriber_id());
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(Frame::Tracking(effect)));
        Self { subscriber_id }
    }

    /// Enter a frame in which reads are not tracked.
    pub fn untracked() -> Self {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(Frame::Untracked));
        Self {
            subscriber_id: None,
        }
    }

    /// Check if reads are currently being tracked.
    pub fn is_active() -> bool {
        Self::current_subscriber().is_some()
    }

    /// Get the current subscriber ID, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(Frame::subscriber_id))
    }

    /// The effect that reads should subscribe, if any.
    pub(crate) fn current_effect() -> Option<Effect> {
        CONTEXT_STACK.with(|stack| match stack.borrow().last() {
            Some(Frame::Tracking(effect)) => Some(effect.clone()),
            _ => None,
        })
    }

    /// Number of frames on this thread's stack.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        let popped = CONTEXT_STACK.with(|stack| stack.borrow_mut().pop());

        // Mismatched pops mean a guard escaped its scope.
        if let Some(frame) = popped {
            debug_assert_eq!(
                frame.subscriber_id(),
                self.subscriber_id,
                "ReactiveContext mismatch: expected {:?}, got {:?}",
                self.subscriber_id,
                frame.subscriber_id()
            );
        }
    }
}

/// Run `f` without subscribing the current computation to anything it reads.
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    let _ctx = ReactiveContext::untracked();
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_tracks_effect() {
        let effect = Effect::new_lazy(|| {});
        let id = effect.subscriber_id();

        assert!(!ReactiveContext::is_active());
        assert!(ReactiveContext::current_subscriber().is_none());

        {
            let _ctx = ReactiveContext::enter(effect.clone());

            assert!(ReactiveContext::is_active());
            assert_eq!(ReactiveContext::current_subscriber(), Some(id));
        }

        assert!(!ReactiveContext::is_active());
        assert_eq!(ReactiveContext::depth(), 0);
    }

    #[test]
    fn nested_contexts() {
        let outer = Effect::new_lazy(|| {});
        let inner = Effect::new_lazy(|| {});

        {
            let _ctx1 = ReactiveContext::enter(outer.clone());
            assert_eq!(
                ReactiveContext::current_subscriber(),
                Some(outer.subscriber_id())
            );

            {
                let _ctx2 = ReactiveContext::enter(inner.clone());
                assert_eq!(
                    ReactiveContext::current_subscriber(),
                    Some(inner.subscriber_id())
                );
            }

            assert_eq!(
                ReactiveContext::current_subscriber(),
                Some(outer.subscriber_id())
            );
        }

        assert!(ReactiveContext::current_subscriber().is_none());
    }

    #[test]
    fn untrack_hides_the_current_effect() {
        let effect = Effect::new_lazy(|| {});
        let _ctx = ReactiveContext::enter(effect);

        let seen = untrack(ReactiveContext::current_subscriber);
        assert!(seen.is_none());
        assert!(ReactiveContext::is_active());
    }

    #[test]
    fn stack_is_restored_after_panic() {
        let effect = Effect::new_lazy(|| {});
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ctx = ReactiveContext::enter(effect);
            panic!("body failed");
        }));

        assert!(result.is_err());
        assert_eq!(ReactiveContext::depth(), 0);
    }
}
