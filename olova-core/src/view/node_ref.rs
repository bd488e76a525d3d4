//! Ref slots: a handle to the live element built for a `ref` prop.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::dom::Node;
use crate::reactive::Owner;

/// A mutable cell bound to one element.
///
/// Empty before the element is built, set while it is mounted, and emptied
/// again when the owning subtree unmounts.
#[derive(Clone, Default)]
pub struct NodeRef {
    current: Rc<RefCell<Option<Node>>>,
}

impl NodeRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bound element, if any.
    pub fn get(&self) -> Option<Node> {
        self.current.borrow().as_ref().map(Node::resolve)
    }

    /// Bind the slot to `node`.
    pub fn bind(&self, node: &Node) {
        *self.current.borrow_mut() = Some(node.clone());
    }

    /// Empty the slot.
    pub fn clear(&self) {
        self.current.borrow_mut().take();
    }

    pub fn is_bound(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Empty the slot if it still points at `node`.
    fn release(&self, node: &Node) {
        let bound_here = self
            .current
            .borrow()
            .as_ref()
            .is_some_and(|current| current.ptr_eq(node));
        if bound_here {
            self.clear();
        }
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef").field("current", &self.get()).finish()
    }
}

/// Create an empty ref slot.
pub fn set_ref() -> NodeRef {
    NodeRef::new()
}

/// What a `ref` prop binds: a slot, or a callback that receives the element
/// on attach and `None` on detach.
#[derive(Clone)]
pub enum RefTarget {
    Slot(NodeRef),
    Callback(Rc<dyn Fn(Option<&Node>)>),
}

impl RefTarget {
    pub fn callback(f: impl Fn(Option<&Node>) + 'static) -> Self {
        RefTarget::Callback(Rc::new(f))
    }

    /// Bind to `node` and arrange for the binding to be released when the
    /// current owner is disposed.
    pub(crate) fn attach(&self, node: &Node) {
        match self {
            RefTarget::Slot(slot) => slot.bind(node),
            RefTarget::Callback(f) => f(Some(node)),
        }

        if let Some(owner) = Owner::current() {
            let target = self.clone();
            let node = node.clone();
            owner.on_dispose(move || {
                trace!(node = node.id(), "detaching ref");
                target.detach(&node);
            });
        }
    }

    fn detach(&self, node: &Node) {
        match self {
            RefTarget::Slot(slot) => slot.release(node),
            RefTarget::Callback(f) => f(None),
        }
    }
}

impl From<NodeRef> for RefTarget {
    fn from(slot: NodeRef) -> Self {
        RefTarget::Slot(slot)
    }
}

impl From<&NodeRef> for RefTarget {
    fn from(slot: &NodeRef) -> Self {
        RefTarget::Slot(slot.clone())
    }
}

impl fmt::Debug for RefTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefTarget::Slot(slot) => f.debug_tuple("Slot").field(slot).finish(),
            RefTarget::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_is_empty_until_bound() {
        let slot = set_ref();
        assert!(slot.get().is_none());

        let node = Node::element("input").unwrap();
        slot.bind(&node);
        assert!(slot.get().unwrap().ptr_eq(&node));
    }

    #[test]
    fn owner_dispose_releases_slot() {
        let slot = set_ref();
        let node = Node::element("div").unwrap();
        let owner = Owner::new();

        owner.run(|| RefTarget::from(&slot).attach(&node));
        assert!(slot.is_bound());

        owner.dispose();
        assert!(!slot.is_bound());
    }

    #[test]
    fn release_keeps_rebound_slot() {
        let slot = set_ref();
        let first = Node::element("div").unwrap();
        let second = Node::element("div").unwrap();
        let owner = Owner::new();

        owner.run(|| RefTarget::from(&slot).attach(&first));
        slot.bind(&second);
        owner.dispose();

        assert!(slot.get().unwrap().ptr_eq(&second));
    }

    #[test]
    fn callback_sees_attach_and_detach() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let target = RefTarget::callback(move |node| s.borrow_mut().push(node.is_some()));
        let owner = Owner::new();

        owner.run(|| target.attach(&Node::element("p").unwrap()));
        owner.dispose();

        assert_eq!(*seen.borrow(), vec![true, false]);
    }
}
