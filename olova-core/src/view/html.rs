//! The element factory.
//!
//! [`html`] turns a tag, props and children into a [`Node`]. Work that
//! outlives construction (reactive children, async children, refs, lifecycle
//! callbacks) is registered with the current [`Owner`]. When `html` runs
//! with no owner, it builds under a fresh scope and parks that scope on the
//! returned node; whoever inserts the node later (a parent `html` call or
//! the renderer) adopts it.
//!
//! A node that fails to build degrades to a comment placeholder and the
//! failure is logged. Its siblings and parent are unaffected.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::child::Child;
use super::node_ref::RefTarget;
use super::pending::spawn_pending;
use super::props::{Prop, Props};
use crate::dom::Node;
use crate::error::{DomError, ViewError};
use crate::reactive::{untrack, Effect, Owner};

/// Marker for a fragment tag: children without a wrapping element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fragment;

type RenderFn = Rc<dyn Fn(Props, Vec<Child>) -> Node>;

/// A named component function.
#[derive(Clone)]
pub struct Component {
    name: Rc<str>,
    render: RenderFn,
}

impl Component {
    pub fn new(name: &str, render: impl Fn(Props, Vec<Child>) -> Node + 'static) -> Self {
        Self {
            name: Rc::from(name),
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

/// What `html` builds.
#[derive(Debug, Clone)]
pub enum Tag {
    /// An intrinsic element such as `"div"`.
    Element(String),
    Component(Component),
    Fragment,
}

impl Tag {
    fn label(&self) -> String {
        match self {
            Tag::Element(tag) => tag.clone(),
            Tag::Component(component) => format!("<{}>", component.name()),
            Tag::Fragment => "<>".to_string(),
        }
    }
}

impl From<&str> for Tag {
    fn from(tag: &str) -> Self {
        Tag::Element(tag.to_string())
    }
}

impl From<String> for Tag {
    fn from(tag: String) -> Self {
        Tag::Element(tag)
    }
}

impl From<Component> for Tag {
    fn from(component: Component) -> Self {
        Tag::Component(component)
    }
}

impl From<&Component> for Tag {
    fn from(component: &Component) -> Self {
        Tag::Component(component.clone())
    }
}

impl From<Fragment> for Tag {
    fn from(_: Fragment) -> Self {
        Tag::Fragment
    }
}

/// Build a node.
///
/// ```rust
/// use olova_core::{children, html, Props};
///
/// let node = html("div", Props::new().class("x"), children!["hello"]);
/// assert_eq!(node.to_html(), r#"<div class="x">hello</div>"#);
/// ```
pub fn html(tag: impl Into<Tag>, props: Props, children: Vec<Child>) -> Node {
    let tag = tag.into();
    if Owner::current().is_some() {
        return construct(tag, props, children);
    }

    let scope = Owner::new();
    let node = scope.run(|| construct(tag, props, children));
    node.attach_pending_owner(scope);
    node
}

/// Build a node, or a placeholder comment when building fails.
///
/// The node builds in its own scope so a failure can tear down whatever the
/// partial build registered.
fn construct(tag: Tag, props: Props, children: Vec<Child>) -> Node {
    let label = tag.label();
    let scope = Owner::child();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        scope.run(|| try_construct(tag, props, children))
    }));

    let err = match outcome {
        Ok(Ok(node)) => return node,
        Ok(Err(err)) => err,
        Err(payload) => {
            debug!(
                tag = %label,
                panic = panic_message(payload.as_ref()),
                "node panicked while building"
            );
            ViewError::Panicked(label.clone())
        }
    };

    scope.dispose();
    warn!(tag = %label, error = %err, "node failed to build; rendering placeholder");
    Node::comment(format!("olova: {err}"))
}

fn try_construct(tag: Tag, props: Props, children: Vec<Child>) -> Result<Node, ViewError> {
    match tag {
        Tag::Element(name) => build_element(&name, props, children),
        Tag::Fragment => {
            if !props.is_empty() {
                trace!(count = props.len(), "ignoring props on fragment");
            }
            let fragment = Node::fragment();
            append_children(&fragment, children)?;
            Ok(fragment)
        }
        Tag::Component(component) => {
            let node = run_component(&component, props, children)?;
            claim_pending_owner(&node);
            Ok(node)
        }
    }
}

/// What an element needs after its attributes are applied.
struct Shell {
    element: Node,
    inner_html: Option<String>,
    refs: Vec<RefTarget>,
}

fn build_element(tag: &str, props: Props, children: Vec<Child>) -> Result<Node, ViewError> {
    let shell = match element_shell(tag, props) {
        Ok(shell) => shell,
        Err(err) => {
            discard(children);
            return Err(err);
        }
    };

    match shell.inner_html {
        Some(markup) => {
            if !children.iter().all(Child::is_empty) {
                debug!(tag, "children ignored in favour of dangerouslySetInnerHTML");
            }
            discard(children);
            shell.element.set_inner_html(&markup);
        }
        None => append_children(&shell.element, children)?,
    }

    for target in &shell.refs {
        target.attach(&shell.element);
    }
    Ok(shell.element)
}

fn element_shell(tag: &str, props: Props) -> Result<Shell, ViewError> {
    let element = Node::element(tag)?;
    let mut inner_html = None;
    let mut refs = Vec::new();

    for (key, value) in props {
        match Prop::classify(&key, value)? {
            Prop::Class(class) => element.set_attribute("class", &class)?,
            Prop::Style(style) => element.set_attribute("style", &style.to_css())?,
            Prop::InnerHtml(markup) => inner_html = Some(markup),
            Prop::Ref(target) => refs.push(target),
            Prop::Event { name, handler } => element.add_event_listener(&name, handler),
            Prop::Attribute { name, value } => match value.render() {
                Some(text) => element.set_attribute(&name, &text)?,
                None => {
                    element.remove_attribute(&name);
                }
            },
        }
    }

    Ok(Shell {
        element,
        inner_html,
        refs,
    })
}

fn run_component(
    component: &Component,
    props: Props,
    children: Vec<Child>,
) -> Result<Node, ViewError> {
    let scope = Owner::child();
    let render = component.render.clone();
    trace!(component = component.name(), "running component");

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        scope.run(|| untrack(|| render(props, children)))
    }));

    outcome.map_err(|payload| {
        scope.dispose();
        debug!(
            component = component.name(),
            panic = panic_message(payload.as_ref()),
            "component panicked"
        );
        ViewError::ComponentPanicked(component.name().to_string())
    })
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Hand a node's parked scope to the current owner.
fn claim_pending_owner(node: &Node) {
    if let Some(pending) = node.take_pending_owner() {
        match Owner::current() {
            Some(owner) => owner.adopt(pending),
            None => node.attach_pending_owner(pending),
        }
    }
}

/// Dispose the parked scopes of children that will never be inserted.
fn discard(children: Vec<Child>) {
    for child in children {
        match child {
            Child::Node(node) => {
                if let Some(pending) = node.take_pending_owner() {
                    pending.dispose();
                }
            }
            Child::List(list) => discard(list),
            _ => {}
        }
    }
}

fn append_children(parent: &Node, children: Vec<Child>) -> Result<(), DomError> {
    let mut nodes = Vec::new();
    for child in children {
        materialize(child, &mut nodes);
    }
    for node in &nodes {
        parent.append_child(node)?;
    }
    Ok(())
}

/// Turn a child into the nodes it stands for, appending them to `out`.
///
/// Fragments are flattened into their children. Reactive and pending
/// children register their effect or task with the current owner.
pub(crate) fn materialize(child: Child, out: &mut Vec<Node>) {
    match child {
        Child::Empty => {}
        Child::Text(text) => out.push(Node::text(text)),
        Child::Node(node) => {
            claim_pending_owner(&node);
            if node.is_fragment() {
                out.extend(node.take_fragment_children());
            } else {
                out.push(node);
            }
        }
        Child::List(children) => {
            for child in children {
                materialize(child, out);
            }
        }
        Child::Reactive(render) => out.extend(reactive_region(render)),
        Child::Pending(future) => {
            let placeholder = Node::comment("pending");
            spawn_pending(&placeholder, future);
            out.push(placeholder);
        }
    }
}

/// Run `render` in an effect that keeps the nodes it produced up to date.
/// Returns the initial nodes.
fn reactive_region(render: Rc<dyn Fn() -> Child>) -> Vec<Node> {
    let current: Rc<RefCell<Vec<Node>>> = Rc::new(RefCell::new(Vec::new()));
    let region = current.clone();

    Effect::new(move || {
        let child = render();
        let previous = region.borrow().clone();

        if let (Child::Text(text), [only]) = (&child, previous.as_slice()) {
            if only.is_text() {
                only.set_data(text);
                return;
            }
        }

        let mut next = Vec::new();
        materialize(child, &mut next);
        if next.is_empty() {
            next.push(Node::comment(""));
        }

        if let Err(err) = swap_region(&previous, &next) {
            warn!(error = %err, "failed to update reactive region");
        }
        *region.borrow_mut() = next;
    });

    let nodes = current.borrow().clone();
    nodes
}

/// Put `next` where `previous` is in the tree. Nodes present in both keep
/// their identity and take their position from `next`.
pub(crate) fn swap_region(previous: &[Node], next: &[Node]) -> Result<(), DomError> {
    let Some(first) = previous.first() else {
        return Ok(());
    };
    let Some(parent) = first.parent() else {
        trace!("reactive region not attached yet; replacing nodes detached");
        return Ok(());
    };

    let anchor = Node::comment("");
    parent.insert_before(&anchor, Some(first))?;
    let placed = next
        .iter()
        .try_for_each(|node| parent.insert_before(node, Some(&anchor)));
    for node in previous {
        if !next.iter().any(|n| n.ptr_eq(node)) {
            node.remove();
        }
    }
    anchor.remove();
    placed
}
