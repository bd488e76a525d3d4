//! Ownership tree.
//!
//! An [`Owner`] is a scope that collects everything created while it is the
//! current owner: effects (and therefore memos and reactive children), child
//! scopes, lifecycle callbacks and dispose hooks (ref detachment, task
//! aborts). Disposing an owner tears all of it down, which is how unmounting
//! a subtree cascades.
//!
//! Ordering:
//! - `mount` fires innermost-first: owned children in creation order, then
//!   the owner's own callbacks in registration order.
//! - `dispose` fires outermost-first: the owner's own unmount callbacks, then
//!   owned children in creation order, then dispose hooks.
//!
//! Each callback list is drained when it fires, so a callback runs at most
//! once per mount cycle.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};

use super::effect::Effect;

type Callback = Box<dyn FnOnce()>;

thread_local! {
    static OWNER_STACK: RefCell<Vec<Owner>> = const { RefCell::new(Vec::new()) };
}

fn next_owner_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Something an owner is responsible for disposing.
#[derive(Clone)]
enum Owned {
    Scope(Owner),
    Effect(Effect),
}

struct OwnerInner {
    id: u64,
    children: RefCell<Vec<Owned>>,
    mount_callbacks: RefCell<Vec<Callback>>,
    unmount_callbacks: RefCell<Vec<Callback>>,
    dispose_hooks: RefCell<Vec<Callback>>,
    parent: RefCell<Weak<OwnerInner>>,
    mounted: Cell<bool>,
    disposed: Cell<bool>,
}

/// A lifecycle scope. Cloning shares the scope.
#[derive(Clone)]
pub struct Owner {
    inner: Rc<OwnerInner>,
}

/// Weak handle to an [`Owner`], used by work that must not keep a scope alive.
#[derive(Clone)]
pub struct WeakOwner {
    inner: Weak<OwnerInner>,
}

impl WeakOwner {
    /// Upgrade if the scope still exists and has not been disposed.
    pub fn upgrade(&self) -> Option<Owner> {
        self.inner
            .upgrade()
            .map(|inner| Owner { inner })
            .filter(|owner| !owner.is_disposed())
    }
}

/// Guard that pops the owner stack when dropped.
pub struct OwnerGuard {
    id: u64,
}

impl Drop for OwnerGuard {
    fn drop(&mut self) {
        let popped = OWNER_STACK.with(|stack| stack.borrow_mut().pop());
        if let Some(owner) = popped {
            debug_assert_eq!(owner.id(), self.id, "owner stack mismatch");
        }
    }
}

impl Owner {
    /// Create a detached scope with no parent.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(OwnerInner {
                id: next_owner_id(),
                children: RefCell::new(Vec::new()),
                mount_callbacks: RefCell::new(Vec::new()),
                unmount_callbacks: RefCell::new(Vec::new()),
                dispose_hooks: RefCell::new(Vec::new()),
                parent: RefCell::new(Weak::new()),
                mounted: Cell::new(false),
                disposed: Cell::new(false),
            }),
        }
    }

    /// Create a scope owned by the current owner, or a detached one when
    /// nothing is current.
    pub fn child() -> Self {
        let scope = Self::new();
        if let Some(parent) = Self::current() {
            parent.adopt(scope.clone());
        }
        scope
    }

    /// The owner at the top of this thread's owner stack.
    pub fn current() -> Option<Owner> {
        OWNER_STACK.with(|stack| stack.borrow().last().cloned())
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn downgrade(&self) -> WeakOwner {
        WeakOwner {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn ptr_eq(&self, other: &Owner) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Make this the current owner until the guard drops.
    pub fn enter(&self) -> OwnerGuard {
        OWNER_STACK.with(|stack| stack.borrow_mut().push(self.clone()));
        OwnerGuard { id: self.id() }
    }

    /// Run `f` with this scope as the current owner.
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = self.enter();
        f()
    }

    /// Take ownership of a scope created elsewhere.
    ///
    /// A scope adopted into a mounted owner is mounted immediately.
    pub fn adopt(&self, scope: Owner) {
        if scope.ptr_eq(self) {
            return;
        }
        if self.is_disposed() {
            scope.dispose();
            return;
        }
        *scope.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
        self.inner
            .children
            .borrow_mut()
            .push(Owned::Scope(scope.clone()));
        if self.is_mounted() {
            scope.mount();
        }
    }

    pub(crate) fn own_effect(&self, effect: Effect) {
        if self.is_disposed() {
            effect.dispose();
            return;
        }
        self.inner.children.borrow_mut().push(Owned::Effect(effect));
    }

    /// Queue a callback for when this scope is mounted. On an already
    /// mounted scope the callback runs right away.
    pub fn on_mount(&self, f: impl FnOnce() + 'static) {
        if self.is_disposed() {
            return;
        }
        if self.is_mounted() {
            f();
        } else {
            self.inner.mount_callbacks.borrow_mut().push(Box::new(f));
        }
    }

    /// Queue a callback for when this scope is disposed.
    pub fn on_unmount(&self, f: impl FnOnce() + 'static) {
        if self.is_disposed() {
            return;
        }
        self.inner.unmount_callbacks.borrow_mut().push(Box::new(f));
    }

    /// Queue internal teardown (ref detachment, task aborts). Runs after the
    /// unmount callbacks and after owned children are disposed.
    pub(crate) fn on_dispose(&self, f: impl FnOnce() + 'static) {
        if self.is_disposed() {
            f();
            return;
        }
        self.inner.dispose_hooks.borrow_mut().push(Box::new(f));
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Fire mount callbacks for this scope and everything it owns.
    pub fn mount(&self) {
        if self.is_disposed() || self.inner.mounted.replace(true) {
            return;
        }

        let children = self.inner.children.borrow().clone();
        for child in children {
            match child {
                Owned::Scope(scope) => scope.mount(),
                Owned::Effect(effect) => {
                    if let Some(scope) = effect.run_scope() {
                        scope.mount();
                    }
                }
            }
        }

        let callbacks = std::mem::take(&mut *self.inner.mount_callbacks.borrow_mut());
        if !callbacks.is_empty() {
            debug!(owner = self.id(), count = callbacks.len(), "running mount callbacks");
        }
        for callback in callbacks {
            callback();
        }
    }

    /// Tear down the scope. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        trace!(owner = self.id(), "disposing owner");

        let callbacks = std::mem::take(&mut *self.inner.unmount_callbacks.borrow_mut());
        for callback in callbacks {
            callback();
        }

        let children = std::mem::take(&mut *self.inner.children.borrow_mut());
        for child in children {
            match child {
                Owned::Scope(scope) => scope.dispose(),
                Owned::Effect(effect) => effect.dispose(),
            }
        }

        let hooks = std::mem::take(&mut *self.inner.dispose_hooks.borrow_mut());
        for hook in hooks {
            hook();
        }

        self.inner.mount_callbacks.borrow_mut().clear();

        let parent = self.inner.parent.borrow().upgrade();
        if let Some(parent) = parent {
            parent.children.borrow_mut().retain(|owned| match owned {
                Owned::Scope(scope) => !Rc::ptr_eq(&scope.inner, &self.inner),
                Owned::Effect(_) => true,
            });
        }
    }

    /// Number of scopes and effects directly owned.
    pub fn owned_count(&self) -> usize {
        self.inner.children.borrow().len()
    }
}

impl Default for Owner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Owner")
            .field("id", &self.id())
            .field("owned", &self.owned_count())
            .field("mounted", &self.is_mounted())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_sets_current_owner() {
        let owner = Owner::new();
        assert!(Owner::current().is_none());

        owner.run(|| {
            let current = Owner::current().expect("owner should be current");
            assert!(current.ptr_eq(&owner));
        });

        assert!(Owner::current().is_none());
    }

    #[test]
    fn mount_fires_children_before_parent() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let root = Owner::new();

        root.run(|| {
            let l = log.clone();
            root.on_mount(move || l.borrow_mut().push("root"));

            let child = Owner::child();
            let l = log.clone();
            child.on_mount(move || l.borrow_mut().push("child"));
        });

        root.mount();
        root.mount();
        assert_eq!(*log.borrow(), vec!["child", "root"]);
    }

    #[test]
    fn dispose_fires_parent_before_children_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let root = Owner::new();

        root.run(|| {
            let l = log.clone();
            root.on_unmount(move || l.borrow_mut().push("root"));

            let child = Owner::child();
            let l = log.clone();
            child.on_unmount(move || l.borrow_mut().push("child"));
        });

        root.dispose();
        root.dispose();
        assert_eq!(*log.borrow(), vec!["root", "child"]);
    }

    #[test]
    fn disposed_child_leaves_parent() {
        let root = Owner::new();
        let child = root.run(Owner::child);
        assert_eq!(root.owned_count(), 1);

        child.dispose();
        assert_eq!(root.owned_count(), 0);
    }

    #[test]
    fn adopting_into_mounted_owner_mounts() {
        let fired = Rc::new(Cell::new(false));
        let root = Owner::new();
        root.mount();

        let orphan = Owner::new();
        let f = fired.clone();
        orphan.on_mount(move || f.set(true));
        root.adopt(orphan);

        assert!(fired.get());
    }

    #[test]
    fn dispose_hooks_run_after_unmount_callbacks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let owner = Owner::new();

        let l = log.clone();
        owner.on_dispose(move || l.borrow_mut().push("hook"));
        let l = log.clone();
        owner.on_unmount(move || l.borrow_mut().push("unmount"));

        owner.dispose();
        assert_eq!(*log.borrow(), vec!["unmount", "hook"]);
    }

    #[test]
    fn weak_owner_does_not_upgrade_after_dispose() {
        let owner = Owner::new();
        let weak = owner.downgrade();
        assert!(weak.upgrade().is_some());

        owner.dispose();
        assert!(weak.upgrade().is_none());
    }
}
