//! Rendering
//!
//! Mounts a built tree into a root node and drives its lifecycle.
//!
//! # Mounting
//!
//! [`render`] builds the component inside a fresh root scope, then attaches
//! the result: appended after clearing the root, appended next to existing
//! content, or hydrated onto existing markup. Mount callbacks fire once the
//! nodes are attached.
//!
//! # Unmounting
//!
//! [`Mounted::unmount`] disposes the root scope. Unmount callbacks run
//! outermost-first, then every effect, memo, ref binding and pending task
//! created under the tree is torn down, then the nodes are removed.

mod hydrate;
mod lifecycle;
mod mount;
mod options;

pub use hydrate::HydrationStats;
pub use lifecycle::{on_mount, on_unmount};
pub use mount::{render, try_render, Mounted, Renderable, RootTarget};
pub use options::{BeforeRender, RenderOptions};
