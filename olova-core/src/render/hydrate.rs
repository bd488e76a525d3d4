//! Hydration: attach a freshly built tree to markup already in the root.
//!
//! Existing children are walked positionally against the fresh nodes. A pair
//! with the same kind (and tag, for elements) is reused: the fresh node's
//! listeners move to the existing node, the children are reconciled the same
//! way, and the fresh node is forwarded to the existing one so effects and
//! refs that captured it operate on the reused node. Existing attributes and
//! text are kept as they are.
//!
//! A mismatched pair replaces the existing node. Extra existing nodes are
//! removed and missing ones appended.

use tracing::{debug, warn};

use crate::dom::{Node, NodeKind};
use crate::error::DomError;

/// What a hydration pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HydrationStats {
    pub reused: usize,
    pub replaced: usize,
    pub appended: usize,
    pub removed: usize,
}

pub(crate) fn hydrate(root: &Node, fresh: &[Node]) -> Result<HydrationStats, DomError> {
    let mut stats = HydrationStats::default();
    reconcile(root, fresh, &mut stats)?;
    debug!(
        reused = stats.reused,
        replaced = stats.replaced,
        appended = stats.appended,
        removed = stats.removed,
        "hydrated root"
    );
    Ok(stats)
}

fn same_shape(existing: &Node, fresh: &Node) -> bool {
    match (existing.kind(), fresh.kind()) {
        (NodeKind::Element(a), NodeKind::Element(b)) => a == b,
        (a, b) => a == b,
    }
}

fn reconcile(parent: &Node, fresh: &[Node], stats: &mut HydrationStats) -> Result<(), DomError> {
    let existing = parent.children();

    for (index, node) in fresh.iter().enumerate() {
        match existing.get(index) {
            Some(current) if same_shape(current, node) => {
                reuse(current, node, stats)?;
                stats.reused += 1;
            }
            Some(current) => {
                warn!(
                    index,
                    expected = ?node.kind(),
                    found = ?current.kind(),
                    "hydration mismatch; replacing node"
                );
                parent.replace_child(node, current)?;
                stats.replaced += 1;
            }
            None => {
                parent.append_child(node)?;
                stats.appended += 1;
            }
        }
    }

    for surplus in existing.iter().skip(fresh.len()) {
        surplus.remove();
        stats.removed += 1;
    }
    Ok(())
}

fn reuse(existing: &Node, fresh: &Node, stats: &mut HydrationStats) -> Result<(), DomError> {
    for (event, handler) in fresh.take_listeners() {
        existing.add_event_listener(&event, handler);
    }

    if fresh.is_element() && fresh.inner_html().is_none() {
        let children = fresh.clear_children();
        reconcile(existing, &children, stats)?;
    }

    fresh.forward_to(existing);
    Ok(())
}
