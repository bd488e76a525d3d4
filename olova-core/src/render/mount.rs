//! Mounting a tree into a root node.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use super::hydrate::{hydrate, HydrationStats};
use super::options::RenderOptions;
use crate::dom::{Document, Node};
use crate::error::RenderError;
use crate::reactive::Owner;
use crate::view::{html, materialize, panic_message, Child, Component, Props};

/// What to render: a component closure, or content built up front.
pub enum Renderable {
    Component(Box<dyn FnOnce() -> Child>),
    Content(Child),
}

impl Renderable {
    /// Render by calling `f` inside the root scope, so its effects and
    /// lifecycle callbacks belong to the mounted tree.
    pub fn component<F, C>(f: F) -> Self
    where
        F: FnOnce() -> C + 'static,
        C: Into<Child>,
    {
        Renderable::Component(Box::new(move || f().into()))
    }

    fn build(self) -> Vec<Node> {
        let child = match self {
            Renderable::Component(f) => f(),
            Renderable::Content(child) => child,
        };
        let mut nodes = Vec::new();
        materialize(child, &mut nodes);
        nodes
    }
}

impl From<Node> for Renderable {
    fn from(node: Node) -> Self {
        Renderable::Content(Child::Node(node))
    }
}

impl From<Vec<Node>> for Renderable {
    fn from(nodes: Vec<Node>) -> Self {
        Renderable::Content(Child::from(nodes))
    }
}

impl From<Option<Node>> for Renderable {
    fn from(node: Option<Node>) -> Self {
        Renderable::Content(Child::from(node))
    }
}

impl From<Child> for Renderable {
    fn from(child: Child) -> Self {
        Renderable::Content(child)
    }
}

impl From<Component> for Renderable {
    fn from(component: Component) -> Self {
        Renderable::component(move || html(component, Props::new(), Vec::new()))
    }
}

impl fmt::Debug for Renderable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Renderable::Component(_) => f.write_str("Component(..)"),
            Renderable::Content(child) => f.debug_tuple("Content").field(child).finish(),
        }
    }
}

/// Where to render: a node, or a selector resolved against the current
/// document.
#[derive(Debug, Clone)]
pub enum RootTarget {
    Node(Node),
    Selector(String),
}

impl RootTarget {
    fn resolve(self) -> Result<Node, RenderError> {
        match self {
            RootTarget::Node(node) => Ok(node.resolve()),
            RootTarget::Selector(selector) => Document::current()
                .query_selector(&selector)?
                .ok_or(RenderError::RootNotFound(selector)),
        }
    }
}

impl From<&str> for RootTarget {
    fn from(selector: &str) -> Self {
        RootTarget::Selector(selector.to_string())
    }
}

impl From<String> for RootTarget {
    fn from(selector: String) -> Self {
        RootTarget::Selector(selector)
    }
}

impl From<Node> for RootTarget {
    fn from(node: Node) -> Self {
        RootTarget::Node(node)
    }
}

impl From<&Node> for RootTarget {
    fn from(node: &Node) -> Self {
        RootTarget::Node(node.clone())
    }
}

/// A tree mounted into a root.
///
/// Dropping the handle leaves the tree mounted; call [`unmount`](Self::unmount)
/// to tear it down.
pub struct Mounted {
    root: Node,
    owner: Owner,
    /// Root children that were there before mounting and are not ours.
    retained: Vec<Node>,
    hydration: Option<HydrationStats>,
}

impl Mounted {
    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// The top-level nodes the tree currently occupies in the root.
    pub fn nodes(&self) -> Vec<Node> {
        tree_nodes(&self.root, &self.retained)
    }

    /// The single top-level node, or the root when the tree has several.
    pub fn node(&self) -> Node {
        match self.nodes().as_slice() {
            [only] => only.clone(),
            _ => self.root.clone(),
        }
    }

    /// Counts from the hydration pass, when the tree was hydrated.
    pub fn hydration(&self) -> Option<HydrationStats> {
        self.hydration
    }

    pub fn is_mounted(&self) -> bool {
        self.owner.is_mounted() && !self.owner.is_disposed()
    }

    /// Run unmount callbacks, dispose everything the tree created, then
    /// remove its nodes from the root.
    pub fn unmount(self) {
        if self.owner.is_disposed() {
            return;
        }
        debug!(root = self.root.id(), "unmounting tree");

        let current = self.root.mounted_owner();
        if current.is_some_and(|owner| owner.ptr_eq(&self.owner)) {
            self.root.replace_mounted_owner(None);
        }

        self.owner.dispose();
    }
}

fn tree_nodes(root: &Node, retained: &[Node]) -> Vec<Node> {
    root.children()
        .into_iter()
        .filter(|child| !retained.iter().any(|kept| kept.ptr_eq(child)))
        .collect()
}

impl fmt::Debug for Mounted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mounted")
            .field("root", &self.root)
            .field("owner", &self.owner)
            .field("hydration", &self.hydration)
            .finish()
    }
}

/// Build `component` and mount it into `root`.
///
/// Returns the mounted node (the root itself when the tree has several
/// top-level nodes), or `None` when rendering fails. The failure is logged;
/// use [`try_render`] for the reason.
pub fn render(
    component: impl Into<Renderable>,
    root: impl Into<RootTarget>,
    options: RenderOptions,
) -> Option<Node> {
    match try_render(component, root, options) {
        Ok(mounted) => Some(mounted.node()),
        Err(err) => {
            warn!(error = %err, "render failed");
            None
        }
    }
}

/// Build `component` and mount it into `root`, reporting why it failed.
///
/// A tree already mounted into the same root is unmounted first. Mount
/// callbacks fire after the nodes are attached.
pub fn try_render(
    component: impl Into<Renderable>,
    root: impl Into<RootTarget>,
    options: RenderOptions,
) -> Result<Mounted, RenderError> {
    let root = root.into().resolve()?;
    let component = component.into();

    if let Some(previous) = root.replace_mounted_owner(None) {
        debug!(root = root.id(), "replacing previously mounted tree");
        previous.dispose();
    }

    let owner = Owner::new();
    let built = panic::catch_unwind(AssertUnwindSafe(|| owner.run(|| component.build())));
    let nodes = match built {
        Ok(nodes) => nodes,
        Err(payload) => {
            owner.dispose();
            debug!(panic = panic_message(payload.as_ref()), "root component panicked");
            return Err(RenderError::ComponentPanicked);
        }
    };
    if nodes.is_empty() {
        owner.dispose();
        return Err(RenderError::EmptyResult);
    }

    if let Some(before_render) = &options.before_render {
        before_render(&root);
    }

    let attached = attach(&root, &nodes, &options);
    let (retained, hydration) = match attached {
        Ok(attached) => attached,
        Err(err) => {
            owner.dispose();
            return Err(err.into());
        }
    };

    // Disposing the tree, by unmount or by a later render into this root,
    // takes its nodes out after the unmount callbacks have run.
    let weak_root = root.downgrade();
    let ours = retained.clone();
    owner.on_dispose(move || {
        if let Some(root) = weak_root.upgrade() {
            for node in tree_nodes(&root, &ours) {
                node.remove();
            }
        }
    });

    root.replace_mounted_owner(Some(owner.clone()));
    debug!(root = root.id(), nodes = nodes.len(), "mounting tree");
    owner.mount();

    Ok(Mounted {
        root,
        owner,
        retained,
        hydration,
    })
}

type Attached = (Vec<Node>, Option<HydrationStats>);

fn attach(
    root: &Node,
    nodes: &[Node],
    options: &RenderOptions,
) -> Result<Attached, crate::error::DomError> {
    if options.hydrate {
        return Ok((Vec::new(), Some(hydrate(root, nodes)?)));
    }

    let retained = if options.clear {
        root.clear_children();
        Vec::new()
    } else {
        root.children()
    };
    for node in nodes {
        root.append_child(node)?;
    }
    Ok((retained, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{on_mount, on_unmount};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn root() -> Node {
        Node::element("div").unwrap()
    }

    #[test]
    fn renders_into_node_and_clears() {
        let root = root();
        root.append_child(&Node::text("old")).unwrap();

        let node = render(
            Renderable::component(|| html("p", Props::new(), vec!["new".into()])),
            &root,
            RenderOptions::default(),
        )
        .unwrap();

        assert_eq!(root.to_html(), "<div><p>new</p></div>");
        assert_eq!(node.tag_name().as_deref(), Some("p"));
    }

    #[test]
    fn keeps_existing_content_without_clear() {
        let root = root();
        root.append_child(&Node::text("kept")).unwrap();

        let mounted = try_render(
            Renderable::component(|| "added"),
            &root,
            RenderOptions::default().with_clear(false),
        )
        .unwrap();
        assert_eq!(root.to_html(), "<div>keptadded</div>");

        mounted.unmount();
        assert_eq!(root.to_html(), "<div>kept</div>");
    }

    #[test]
    fn empty_result_is_an_error() {
        let err = try_render(Renderable::component(|| ()), &root(), RenderOptions::default())
            .unwrap_err();
        assert_eq!(err, RenderError::EmptyResult);
    }

    #[test]
    fn panicking_root_is_an_error() {
        let err = try_render(
            Renderable::component(|| -> Child { panic!("root failed") }),
            &root(),
            RenderOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, RenderError::ComponentPanicked);
    }

    #[test]
    fn before_render_sees_root_before_attach() {
        let root = root();
        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();

        render(
            Renderable::component(|| html("span", Props::new(), vec![])),
            &root,
            RenderOptions::default().on_before_render(move |root| {
                *s.borrow_mut() = Some(root.child_count());
            }),
        );
        assert_eq!(*seen.borrow(), Some(0));
    }

    #[test]
    fn rerendering_a_root_unmounts_previous_tree() {
        let root = root();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        render(
            Renderable::component(move || {
                on_unmount(move || l.borrow_mut().push("first unmounted"));
                "first"
            }),
            &root,
            RenderOptions::default(),
        );
        let l = log.clone();
        render(
            Renderable::component(move || {
                on_mount(move || l.borrow_mut().push("second mounted"));
                "second"
            }),
            &root,
            RenderOptions::default(),
        );

        assert_eq!(*log.borrow(), vec!["first unmounted", "second mounted"]);
        assert_eq!(root.text_content(), "second");
    }

    #[test]
    fn rerendering_without_clear_removes_previous_tree() {
        let root = root();
        root.append_child(&Node::text("kept")).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (n, set_n) = crate::reactive::set_signal(0);

        let l = log.clone();
        try_render(
            Renderable::component(move || {
                let l = l.clone();
                on_unmount(move || l.borrow_mut().push("A unmounted"));
                html("p", Props::new(), vec![n.into()])
            }),
            &root,
            RenderOptions::default().with_clear(false),
        )
        .unwrap();
        assert_eq!(root.to_html(), "<div>kept<p>0</p></div>");

        let second = try_render(
            Renderable::component(|| html("span", Props::new(), vec!["B".into()])),
            &root,
            RenderOptions::default().with_clear(false),
        )
        .unwrap();
        assert_eq!(*log.borrow(), vec!["A unmounted"]);
        assert_eq!(root.to_html(), "<div>kept<span>B</span></div>");

        set_n.set(7);
        assert_eq!(root.to_html(), "<div>kept<span>B</span></div>");

        second.unmount();
        assert_eq!(root.to_html(), "<div>kept</div>");
    }

    #[test]
    fn prebuilt_nodes_join_the_root_scope() {
        let root = root();
        let fired = Rc::new(RefCell::new(0));
        let f = fired.clone();
        let widget = Component::new("Widget", move |_, _| {
            let f = f.clone();
            on_mount(move || *f.borrow_mut() += 1);
            html("i", Props::new(), vec![])
        });

        let node = html(widget, Props::new(), vec![]);
        let mounted = try_render(node, &root, RenderOptions::default()).unwrap();
        assert_eq!(*fired.borrow(), 1);
        assert_eq!(mounted.owner().owned_count(), 1);
    }
}
