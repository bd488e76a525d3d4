//! Error types.
//!
//! Construction and render failures are reported through these enums. The
//! public entry points (`html`, `render`) contain them: `html` degrades the
//! failing node to a placeholder comment and `render` returns `None`. The
//! `try_*` variants surface them to callers that want the reason.

use thiserror::Error;

/// Errors raised by the in-memory DOM.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The tag name is empty or contains characters not allowed in a name.
    #[error("invalid tag name `{0}`")]
    InvalidTagName(String),

    /// The attribute name is empty or contains whitespace, quotes, `=`, `/` or `>`.
    #[error("invalid attribute name `{0}`")]
    InvalidAttributeName(String),

    /// The selector could not be parsed.
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),

    /// Inserting the node would make it its own ancestor, or the parent
    /// cannot hold children.
    #[error("node cannot be inserted at this position")]
    HierarchyRequest,

    /// The reference node is not a child of the parent.
    #[error("node is not a child of this parent")]
    NotAChild,
}

/// A prop value had the wrong shape for the key it was set under.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropError {
    #[error("prop `{key}` expects {expected}, got {found}")]
    InvalidType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors raised while building a single node with `html`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Prop(#[from] PropError),

    /// The component function panicked while building its node.
    #[error("component `{0}` panicked during construction")]
    ComponentPanicked(String),

    /// Something else panicked while the node was being built, such as the
    /// first run of a reactive child.
    #[error("`{0}` panicked during construction")]
    Panicked(String),
}

/// Errors raised by `try_render`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The selector matched no element in the current document.
    #[error("no element matches root selector `{0}`")]
    RootNotFound(String),

    /// The component produced no nodes.
    #[error("component rendered no content")]
    EmptyResult,

    /// The component closure panicked.
    #[error("root component panicked during construction")]
    ComponentPanicked,

    #[error(transparent)]
    Dom(#[from] DomError),
}
