//! In-memory DOM
//!
//! The host tree the element factory builds and the renderer mounts into.
//! It covers what the runtime needs from a DOM: element, text, comment and
//! fragment nodes, attributes, event listeners, tree mutation, simple
//! selector lookup and HTML serialisation.
//!
//! Nodes are `Rc`-based and not `Send`; each thread has its own current
//! [`Document`].

mod document;
mod event;
mod node;
mod selector;

pub use document::{document, Document};
pub use event::{handler, Event, EventHandler};
pub use node::{Node, NodeKind, NodeSnapshot, WeakNode};
