//! Events delivered to listeners.

use std::rc::Rc;

use super::node::Node;

/// Listener callback.
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// An event being dispatched to a node.
#[derive(Debug, Clone)]
pub struct Event {
    name: String,
    target: Node,
}

impl Event {
    pub fn new(name: impl Into<String>, target: Node) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }

    /// Event type, e.g. `click`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &Node {
        &self.target
    }
}

/// Wrap a closure as an [`EventHandler`].
pub fn handler(f: impl Fn(&Event) + 'static) -> EventHandler {
    Rc::new(f)
}
