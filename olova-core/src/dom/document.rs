//! The per-thread document that selector roots resolve against.

use std::cell::RefCell;

use super::node::{Node, NodeKind};
use crate::error::DomError;

thread_local! {
    static DOCUMENT: RefCell<Document> = RefCell::new(Document::new());
}

/// A document: an `<html>` element holding a `<body>`.
#[derive(Debug, Clone)]
pub struct Document {
    root: Node,
    body: Node,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        let root = Node::from_kind(NodeKind::Element("html".to_string()));
        let body = Node::from_kind(NodeKind::Element("body".to_string()));
        // A fresh element can always take a fresh child.
        let _ = root.append_child(&body);
        Self { root, body }
    }

    /// The thread's current document.
    pub fn current() -> Document {
        DOCUMENT.with(|document| document.borrow().clone())
    }

    /// Replace the thread's current document, returning the previous one.
    pub fn install(document: Document) -> Document {
        DOCUMENT.with(|current| std::mem::replace(&mut *current.borrow_mut(), document))
    }

    pub fn document_element(&self) -> &Node {
        &self.root
    }

    pub fn body(&self) -> &Node {
        &self.body
    }

    pub fn create_element(&self, tag: &str) -> Result<Node, DomError> {
        Node::element(tag)
    }

    pub fn create_text_node(&self, data: &str) -> Node {
        Node::text(data)
    }

    /// First element in the document matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Result<Option<Node>, DomError> {
        self.root.query_selector(selector)
    }

    /// Find an element by its `id` attribute.
    pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
        fn find(node: &Node, id: &str) -> Option<Node> {
            node.children().into_iter().find_map(|child| {
                if child.get_attribute("id").as_deref() == Some(id) {
                    Some(child)
                } else {
                    find(&child, id)
                }
            })
        }
        find(&self.root, id)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// The thread's current document.
pub fn document() -> Document {
    Document::current()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_has_body() {
        let document = Document::new();
        assert_eq!(document.body().tag_name().as_deref(), Some("body"));
        assert!(document.body().parent().unwrap().ptr_eq(document.document_element()));
    }

    #[test]
    fn lookups_find_elements_in_body() {
        let document = Document::new();
        let app = document.create_element("div").unwrap();
        app.set_attribute("id", "app").unwrap();
        document.body().append_child(&app).unwrap();

        assert!(document.query_selector("#app").unwrap().unwrap().ptr_eq(&app));
        assert!(document.get_element_by_id("app").unwrap().ptr_eq(&app));
        assert!(document.get_element_by_id("nope").is_none());
    }

    #[test]
    fn install_swaps_current_document() {
        let fresh = Document::new();
        let body = fresh.body().clone();
        let previous = Document::install(fresh);

        assert!(document().body().ptr_eq(&body));
        Document::install(previous);
    }
}
