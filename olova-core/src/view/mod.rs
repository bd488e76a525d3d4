//! View construction: the element factory, props, children and refs.

mod child;
mod html;
mod node_ref;
mod pending;
mod props;

pub use child::Child;
pub use html::{html, Component, Fragment, Tag};
pub use node_ref::{set_ref, NodeRef, RefTarget};
pub use props::{AttrValue, Prop, PropValue, Props, Style};

pub(crate) use html::{materialize, panic_message};
