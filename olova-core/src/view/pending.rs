//! Async children.
//!
//! A pending child is shown as a comment placeholder while its future runs
//! as a local tokio task. On completion the content is built in its own
//! scope and swapped in for the placeholder. Disposing the owner aborts the
//! task; a task that completes after its owner or placeholder is gone does
//! nothing.
//!
//! Tasks are spawned with [`tokio::task::spawn_local`], so building a
//! pending child must happen inside a [`tokio::task::LocalSet`].

use futures_util::future::LocalBoxFuture;
use tracing::{debug, trace, warn};

use super::child::Child;
use super::html::{materialize, swap_region};
use crate::dom::Node;
use crate::reactive::Owner;

pub(crate) fn spawn_pending(placeholder: &Node, future: LocalBoxFuture<'static, Child>) {
    let owner = Owner::current().unwrap_or_default();
    let weak_owner = owner.downgrade();
    let weak_placeholder = placeholder.downgrade();

    let task = tokio::task::spawn_local(async move {
        let child = future.await;

        let Some(owner) = weak_owner.upgrade() else {
            trace!("async child resolved after its owner was disposed");
            return;
        };
        let Some(placeholder) = weak_placeholder.upgrade() else {
            trace!("async child resolved after its placeholder was dropped");
            return;
        };

        let scope = Owner::new();
        let mut nodes = Vec::new();
        scope.run(|| materialize(child, &mut nodes));
        if nodes.is_empty() {
            nodes.push(Node::comment(""));
        }

        if let Err(err) = swap_region(std::slice::from_ref(&placeholder), &nodes) {
            warn!(error = %err, "failed to insert async child");
            scope.dispose();
            return;
        }
        debug!(nodes = nodes.len(), "async child resolved");
        owner.adopt(scope);
    });

    owner.on_dispose(move || task.abort());
}
