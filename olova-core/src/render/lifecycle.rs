//! Lifecycle callbacks for the scope currently being built.

use tracing::debug;

use crate::reactive::Owner;

/// Run `f` once the surrounding subtree is attached to a live root.
///
/// Mount callbacks fire innermost-first: a component's children mount
/// before the component itself. Called outside any scope, `f` is dropped.
pub fn on_mount(f: impl FnOnce() + 'static) {
    match Owner::current() {
        Some(owner) => owner.on_mount(f),
        None => debug!("on_mount called outside a component; callback dropped"),
    }
}

/// Run `f` once when the surrounding subtree is unmounted, before its
/// effects are disposed and its nodes removed.
///
/// Unmount callbacks fire outermost-first. Called outside any scope, `f` is
/// dropped.
pub fn on_unmount(f: impl FnOnce() + 'static) {
    match Owner::current() {
        Some(owner) => owner.on_unmount(f),
        None => debug!("on_unmount called outside a component; callback dropped"),
    }
}
