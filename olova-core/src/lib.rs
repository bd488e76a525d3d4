//! Olova Core
//!
//! A fine-grained reactive UI runtime over an in-memory DOM. It implements:
//!
//! - Reactive primitives (signals, memos, effects) with automatic
//!   dependency tracking
//! - An ownership tree that ties effects, refs and lifecycle callbacks to
//!   the part of the UI that created them
//! - An element factory that builds DOM nodes from tags, props and children,
//!   keeping reactive children up to date in place
//! - A renderer that mounts, hydrates and unmounts trees
//!
//! Updates are pushed straight from the signal that changed to the effects
//! that read it; there is no virtual DOM and no diffing.
//!
//! # Architecture
//!
//! - `reactive`: signals, effects, memos, owners and batching
//! - `dom`: the host node tree and per-thread document
//! - `view`: `html`, props, children and ref slots
//! - `render`: mounting, hydration and lifecycle callbacks
//!
//! # Example
//!
//! ```rust
//! use olova_core::{children, html, render, set_signal, Child, Node, Props, RenderOptions, Renderable};
//!
//! let root = Node::element("div").unwrap();
//! let (count, set_count) = set_signal(0);
//!
//! render(
//!     Renderable::component(move || {
//!         let set = set_count.clone();
//!         html(
//!             "button",
//!             Props::new().on("click", move |_| {
//!                 set.update(|n| n + 1);
//!             }),
//!             children!["Clicked: ", Child::from(&count)],
//!         )
//!     }),
//!     &root,
//!     RenderOptions::default(),
//! );
//!
//! let button = root.first_child().unwrap();
//! button.dispatch("click");
//! assert_eq!(root.to_html(), "<div><button>Clicked: 1</button></div>");
//! ```
//!
//! # Threading
//!
//! Everything is single-threaded. Handles are `Rc`-based and the tracking,
//! owner and batch state are thread-locals. Async children run as local
//! tokio tasks and need a `tokio::task::LocalSet`.

#[macro_use]
mod macros;

pub mod dom;
pub mod error;
pub mod reactive;
pub mod render;
pub mod view;

pub use dom::{document, Document, Event, Node};
pub use error::{DomError, PropError, RenderError, ViewError};
pub use reactive::{
    batch, set_effect, set_effect_with_cleanup, set_memo, set_signal, untrack, Memo, ReadSignal,
    Signal, WriteSignal,
};
pub use render::{
    on_mount, on_unmount, render, try_render, Mounted, RenderOptions, Renderable, RootTarget,
};
pub use view::{html, set_ref, Child, Component, Fragment, NodeRef, PropValue, Props, Style, Tag};
