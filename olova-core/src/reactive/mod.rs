//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, memos, and
//! effects, plus the ownership tree that ties their lifetime to the UI.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking context (an effect, or a memo's computation), the signal
//! registers that computation as a subscriber. When the value changes, every
//! subscriber re-runs.
//!
//! ## Memos
//!
//! A Memo is a derived value kept in a cache signal by an internal effect.
//! Reading a memo subscribes to the cache, so the computation runs once per
//! change however often the value is read.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change. Effects are used to keep the DOM in sync with state.
//!
//! ## Owners
//!
//! An Owner collects the effects, nested scopes and lifecycle callbacks
//! created while it is current. Disposing it disposes all of them.
//!
//! # Implementation Notes
//!
//! Everything here is single-threaded: handles are `Rc`-based and the
//! tracking, owner and batch state live in thread-locals.

mod context;
mod effect;
mod memo;
mod owner;
mod runtime;
mod signal;
mod subscriber;

pub use context::{untrack, ReactiveContext};
pub use effect::{set_effect, set_effect_with_cleanup, Cleanup, Effect};
pub use memo::{set_memo, Memo};
pub use owner::{Owner, OwnerGuard, WeakOwner};
pub use runtime::{batch, Runtime};
pub use signal::{set_signal, ReadSignal, Signal, WriteSignal};
pub use subscriber::{SourceId, SubscriberId};
