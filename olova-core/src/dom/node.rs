//! DOM nodes.
//!
//! A [`Node`] is a shared handle to an element, text, comment or fragment.
//! Children are held strongly, parents weakly.
//!
//! # Forwarding
//!
//! Hydration reuses existing nodes in place of freshly built ones. The fresh
//! node is then forwarded to the existing one: every operation on the fresh
//! handle resolves to the existing node first. Effects and refs created
//! during construction keep working without knowing hydration happened.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde::Serialize;

use super::event::{Event, EventHandler};
use super::selector::Selector;
use crate::error::DomError;
use crate::reactive::Owner;

fn next_node_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with a lowercase tag name.
    Element(String),
    Text,
    Comment,
    /// A container whose children move into the parent on insertion.
    Fragment,
}

#[derive(Default)]
struct NodeState {
    parent: Weak<NodeInner>,
    children: Vec<Node>,
    attributes: IndexMap<String, String>,
    listeners: Vec<(String, EventHandler)>,
    /// Text of a text or comment node.
    data: String,
    /// Raw markup set through `set_inner_html`; replaces children.
    inner_html: Option<String>,
    /// Set when hydration adopted an existing node in place of this one.
    forward: Option<Node>,
    /// Scope built with this node before it had an owner to join.
    pending_owner: Option<Owner>,
    /// Scope of the tree currently rendered into this node.
    mounted_owner: Option<Owner>,
}

struct NodeInner {
    id: u64,
    kind: NodeKind,
    state: RefCell<NodeState>,
}

/// Shared handle to a DOM node.
#[derive(Clone)]
pub struct Node {
    inner: Rc<NodeInner>,
}

/// Weak handle to a [`Node`].
#[derive(Clone)]
pub struct WeakNode {
    inner: Weak<NodeInner>,
}

impl WeakNode {
    pub fn upgrade(&self) -> Option<Node> {
        self.inner.upgrade().map(|inner| Node { inner })
    }
}

fn is_valid_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == ':')
        }
        _ => false,
    }
}

fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '>' | '/' | '=' | '<')
        })
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

impl Node {
    pub(super) fn from_kind(kind: NodeKind) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                id: next_node_id(),
                kind,
                state: RefCell::new(NodeState::default()),
            }),
        }
    }

    /// Create an element. Tag names are lowercased.
    pub fn element(tag: &str) -> Result<Self, DomError> {
        if !is_valid_tag_name(tag) {
            return Err(DomError::InvalidTagName(tag.to_string()));
        }
        Ok(Self::from_kind(NodeKind::Element(tag.to_ascii_lowercase())))
    }

    pub fn text(data: impl Into<String>) -> Self {
        let node = Self::from_kind(NodeKind::Text);
        node.inner.state.borrow_mut().data = data.into();
        node
    }

    pub fn comment(data: impl Into<String>) -> Self {
        let node = Self::from_kind(NodeKind::Comment);
        node.inner.state.borrow_mut().data = data.into();
        node
    }

    pub fn fragment() -> Self {
        Self::from_kind(NodeKind::Fragment)
    }

    /// The node operations apply to: itself, or the node it forwards to.
    pub fn resolve(&self) -> Node {
        let mut node = self.clone();
        loop {
            let next = node.inner.state.borrow().forward.clone();
            match next {
                Some(target) => node = target,
                None => return node,
            }
        }
    }

    pub(crate) fn forward_to(&self, target: &Node) {
        if !Rc::ptr_eq(&self.inner, &target.inner) {
            self.inner.state.borrow_mut().forward = Some(target.clone());
        }
    }

    pub fn id(&self) -> u64 {
        self.resolve().inner.id
    }

    pub fn kind(&self) -> NodeKind {
        self.resolve().inner.kind.clone()
    }

    pub fn tag_name(&self) -> Option<String> {
        match self.kind() {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind(), NodeKind::Element(_))
    }

    pub fn is_text(&self) -> bool {
        self.kind() == NodeKind::Text
    }

    pub fn is_comment(&self) -> bool {
        self.kind() == NodeKind::Comment
    }

    pub fn is_fragment(&self) -> bool {
        self.kind() == NodeKind::Fragment
    }

    /// Identity comparison after forwarding.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.resolve().inner, &other.resolve().inner)
    }

    pub fn downgrade(&self) -> WeakNode {
        WeakNode {
            inner: Rc::downgrade(&self.resolve().inner),
        }
    }

    // ------------------------------------------------------------------
    // Tree navigation
    // ------------------------------------------------------------------

    pub fn parent(&self) -> Option<Node> {
        let node = self.resolve();
        let parent = node.inner.state.borrow().parent.upgrade();
        parent.map(|inner| Node { inner })
    }

    pub fn children(&self) -> Vec<Node> {
        self.resolve().inner.state.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.resolve().inner.state.borrow().children.len()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.resolve().inner.state.borrow().children.first().cloned()
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn contains(&self, other: &Node) -> bool {
        let mut current = Some(other.resolve());
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Whether the node hangs below `root` (or is `root`).
    pub fn is_connected_to(&self, root: &Node) -> bool {
        root.contains(self)
    }

    fn index_of(&self, child: &Node) -> Option<usize> {
        let child = child.resolve();
        self.resolve()
            .inner
            .state
            .borrow()
            .children
            .iter()
            .position(|c| Rc::ptr_eq(&c.inner, &child.inner))
    }

    // ------------------------------------------------------------------
    // Tree mutation
    // ------------------------------------------------------------------

    fn can_have_children(&self) -> bool {
        matches!(self.kind(), NodeKind::Element(_) | NodeKind::Fragment)
    }

    /// Detach from the current parent, if any.
    pub fn remove(&self) {
        if let Some(parent) = self.parent() {
            let node = self.resolve();
            parent
                .inner
                .state
                .borrow_mut()
                .children
                .retain(|c| !Rc::ptr_eq(&c.inner, &node.inner));
            node.inner.state.borrow_mut().parent = Weak::new();
        }
    }

    /// The nodes that actually get inserted for `node`: a fragment's
    /// children, or the node itself.
    fn insertion_set(node: &Node) -> Vec<Node> {
        let node = node.resolve();
        if node.is_fragment() {
            let children = std::mem::take(&mut node.inner.state.borrow_mut().children);
            for child in &children {
                child.inner.state.borrow_mut().parent = Weak::new();
            }
            children
        } else {
            vec![node]
        }
    }

    /// Insert `new` before `reference`, or at the end when `reference` is
    /// `None`. Fragments insert their children.
    pub fn insert_before(&self, new: &Node, reference: Option<&Node>) -> Result<(), DomError> {
        let parent = self.resolve();
        if !parent.can_have_children() {
            return Err(DomError::HierarchyRequest);
        }
        let new = new.resolve();
        if new.contains(&parent) {
            return Err(DomError::HierarchyRequest);
        }
        if let Some(reference) = reference {
            if parent.index_of(reference).is_none() {
                return Err(DomError::NotAChild);
            }
            if reference.ptr_eq(&new) {
                return Ok(());
            }
        }

        let nodes = Self::insertion_set(&new);
        for node in &nodes {
            node.remove();
        }

        // Look the reference up again: removing `new` may have shifted it.
        let index = match reference {
            Some(reference) => parent.index_of(reference).ok_or(DomError::NotAChild)?,
            None => parent.child_count(),
        };

        let mut state = parent.inner.state.borrow_mut();
        state.inner_html = None;
        for (offset, node) in nodes.into_iter().enumerate() {
            node.inner.state.borrow_mut().parent = Rc::downgrade(&parent.inner);
            state.children.insert(index + offset, node);
        }
        Ok(())
    }

    pub fn append_child(&self, child: &Node) -> Result<(), DomError> {
        self.insert_before(child, None)
    }

    pub fn remove_child(&self, child: &Node) -> Result<Node, DomError> {
        if self.index_of(child).is_none() {
            return Err(DomError::NotAChild);
        }
        child.remove();
        Ok(child.resolve())
    }

    /// Put `new` where `old` is.
    pub fn replace_child(&self, new: &Node, old: &Node) -> Result<Node, DomError> {
        if self.index_of(old).is_none() {
            return Err(DomError::NotAChild);
        }
        if new.ptr_eq(old) {
            return Ok(old.resolve());
        }
        self.insert_before(new, Some(old))?;
        self.remove_child(old)
    }

    /// Remove every child. Returns them in order.
    pub fn clear_children(&self) -> Vec<Node> {
        let node = self.resolve();
        let children = {
            let mut state = node.inner.state.borrow_mut();
            state.inner_html = None;
            std::mem::take(&mut state.children)
        };
        for child in &children {
            child.inner.state.borrow_mut().parent = Weak::new();
        }
        children
    }

    /// Move a fragment's children out. Other nodes return themselves.
    pub(crate) fn take_fragment_children(&self) -> Vec<Node> {
        Self::insertion_set(self)
    }

    // ------------------------------------------------------------------
    // Attributes and content
    // ------------------------------------------------------------------

    pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomError> {
        if !is_valid_attribute_name(name) {
            return Err(DomError::InvalidAttributeName(name.to_string()));
        }
        let node = self.resolve();
        if !node.is_element() {
            return Err(DomError::HierarchyRequest);
        }
        node.inner
            .state
            .borrow_mut()
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.resolve().inner.state.borrow().attributes.get(name).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.resolve().inner.state.borrow().attributes.contains_key(name)
    }

    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.resolve()
            .inner
            .state
            .borrow_mut()
            .attributes
            .shift_remove(name)
    }

    /// Attributes in the order they were first set.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.resolve()
            .inner
            .state
            .borrow()
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn class_name(&self) -> Option<String> {
        self.get_attribute("class")
    }

    /// Data of a text or comment node.
    pub fn data(&self) -> Option<String> {
        let node = self.resolve();
        match node.inner.kind {
            NodeKind::Text | NodeKind::Comment => Some(node.inner.state.borrow().data.clone()),
            _ => None,
        }
    }

    /// Replace the data of a text or comment node. Ignored on other nodes.
    pub fn set_data(&self, data: &str) {
        let node = self.resolve();
        if matches!(node.inner.kind, NodeKind::Text | NodeKind::Comment) {
            node.inner.state.borrow_mut().data = data.to_string();
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let node = self.resolve();
        match &node.inner.kind {
            NodeKind::Text => node.inner.state.borrow().data.clone(),
            NodeKind::Comment => String::new(),
            NodeKind::Element(_) | NodeKind::Fragment => {
                if let Some(html) = node.inner.state.borrow().inner_html.clone() {
                    return html;
                }
                node.children().iter().map(Node::text_content).collect()
            }
        }
    }

    /// Replace the children with raw markup.
    pub fn set_inner_html(&self, markup: &str) {
        self.clear_children();
        self.resolve().inner.state.borrow_mut().inner_html = Some(markup.to_string());
    }

    pub fn inner_html(&self) -> Option<String> {
        self.resolve().inner.state.borrow().inner_html.clone()
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn add_event_listener(&self, event: &str, handler: EventHandler) {
        self.resolve()
            .inner
            .state
            .borrow_mut()
            .listeners
            .push((event.to_string(), handler));
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.resolve()
            .inner
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|(name, _)| name == event)
            .count()
    }

    pub(crate) fn take_listeners(&self) -> Vec<(String, EventHandler)> {
        std::mem::take(&mut self.resolve().inner.state.borrow_mut().listeners)
    }

    /// Invoke the listeners registered for `event`, in registration order.
    /// Returns how many ran.
    pub fn dispatch(&self, event: &str) -> usize {
        let target = self.resolve();
        let handlers: Vec<EventHandler> = target
            .inner
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, handler)| handler.clone())
            .collect();

        let event = Event::new(event, target);
        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }

    // ------------------------------------------------------------------
    // Owners
    // ------------------------------------------------------------------

    pub(crate) fn attach_pending_owner(&self, owner: Owner) {
        self.resolve().inner.state.borrow_mut().pending_owner = Some(owner);
    }

    pub(crate) fn take_pending_owner(&self) -> Option<Owner> {
        self.resolve().inner.state.borrow_mut().pending_owner.take()
    }

    pub(crate) fn replace_mounted_owner(&self, owner: Option<Owner>) -> Option<Owner> {
        let node = self.resolve();
        let mut state = node.inner.state.borrow_mut();
        std::mem::replace(&mut state.mounted_owner, owner)
    }

    pub(crate) fn mounted_owner(&self) -> Option<Owner> {
        self.resolve().inner.state.borrow().mounted_owner.clone()
    }

    // ------------------------------------------------------------------
    // Queries and output
    // ------------------------------------------------------------------

    /// First descendant (depth-first, excluding `self`) matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<Node>, DomError> {
        let selector = Selector::parse(selector)?;
        Ok(self.find_descendant(&selector))
    }

    fn find_descendant(&self, selector: &Selector) -> Option<Node> {
        for child in self.children() {
            if selector.matches(&child) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(selector) {
                return Some(found);
            }
        }
        None
    }

    /// Serialise the subtree as HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        let node = self.resolve();
        let state = node.inner.state.borrow();
        match &node.inner.kind {
            NodeKind::Text => out.push_str(&escape_text(&state.data)),
            NodeKind::Comment => {
                out.push_str("<!--");
                out.push_str(&state.data);
                out.push_str("-->");
            }
            NodeKind::Fragment => {
                for child in &state.children {
                    child.write_html(out);
                }
            }
            NodeKind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in &state.attributes {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_attribute(value));
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                match &state.inner_html {
                    Some(markup) => out.push_str(markup),
                    None => {
                        for child in &state.children {
                            child.write_html(out);
                        }
                    }
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    /// A serialisable copy of the subtree.
    pub fn snapshot(&self) -> NodeSnapshot {
        let node = self.resolve();
        let state = node.inner.state.borrow();
        match &node.inner.kind {
            NodeKind::Text => NodeSnapshot::Text(state.data.clone()),
            NodeKind::Comment => NodeSnapshot::Comment(state.data.clone()),
            NodeKind::Fragment => NodeSnapshot::Fragment(
                state.children.iter().map(Node::snapshot).collect(),
            ),
            NodeKind::Element(tag) => NodeSnapshot::Element {
                tag: tag.clone(),
                attributes: state.attributes.clone(),
                children: state.children.iter().map(Node::snapshot).collect(),
                inner_html: state.inner_html.clone(),
            },
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("children", &self.child_count())
            .finish()
    }
}

/// Serialisable view of a node tree, used for assertions and debugging.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeSnapshot {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        children: Vec<NodeSnapshot>,
        #[serde(skip_serializing_if = "Option::is_none")]
        inner_html: Option<String>,
    },
    Text(String),
    Comment(String),
    Fragment(Vec<NodeSnapshot>),
}
