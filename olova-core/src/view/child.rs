//! Children accepted by `html`.

use std::fmt::{self, Display};
use std::future::Future;
use std::rc::Rc;

use futures_util::future::{FutureExt, LocalBoxFuture};

use crate::dom::Node;
use crate::reactive::{Memo, ReadSignal, Signal};

/// One child slot of an element.
///
/// Lists are flattened depth-first. `Empty` produces nothing. A reactive
/// child is re-evaluated whenever a signal it reads changes and its nodes are
/// replaced in place; a pending child shows a placeholder until its future
/// resolves.
pub enum Child {
    Empty,
    Text(String),
    Node(Node),
    List(Vec<Child>),
    Reactive(Rc<dyn Fn() -> Child>),
    Pending(LocalBoxFuture<'static, Child>),
}

impl Child {
    pub fn text(text: impl Into<String>) -> Self {
        Child::Text(text.into())
    }

    /// A child that tracks what `f` reads and re-renders when it changes.
    pub fn reactive<F, C>(f: F) -> Self
    where
        F: Fn() -> C + 'static,
        C: Into<Child>,
    {
        Child::Reactive(Rc::new(move || f().into()))
    }

    /// A child that renders once `future` resolves.
    pub fn future<F, C>(future: F) -> Self
    where
        F: Future<Output = C> + 'static,
        C: Into<Child> + 'static,
    {
        Child::Pending(future.map(Into::into).boxed_local())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Child::Empty => true,
            Child::List(children) => children.iter().all(Child::is_empty),
            _ => false,
        }
    }
}

impl Default for Child {
    fn default() -> Self {
        Child::Empty
    }
}

impl fmt::Debug for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Empty => f.write_str("Empty"),
            Child::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Child::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Child::List(children) => f.debug_tuple("List").field(children).finish(),
            Child::Reactive(_) => f.write_str("Reactive(..)"),
            Child::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

impl From<()> for Child {
    fn from(_: ()) -> Self {
        Child::Empty
    }
}

/// Booleans render nothing, so `cond && child` patterns stay empty.
impl From<bool> for Child {
    fn from(_: bool) -> Self {
        Child::Empty
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl From<&String> for Child {
    fn from(text: &String) -> Self {
        Child::Text(text.clone())
    }
}

macro_rules! child_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Child {
                fn from(value: $ty) -> Self {
                    Child::Text(value.to_string())
                }
            }
        )*
    };
}

child_from_display!(char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(node)
    }
}

impl From<&Node> for Child {
    fn from(node: &Node) -> Self {
        Child::Node(node.clone())
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(value: Option<T>) -> Self {
        value.map_or(Child::Empty, Into::into)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(children: Vec<T>) -> Self {
        Child::List(children.into_iter().map(Into::into).collect())
    }
}

/// A signal read as a child renders its current value and updates the text
/// when it changes.
impl<T: Display + Clone + 'static> From<ReadSignal<T>> for Child {
    fn from(signal: ReadSignal<T>) -> Self {
        Child::reactive(move || signal.with(ToString::to_string))
    }
}

impl<T: Display + Clone + 'static> From<&ReadSignal<T>> for Child {
    fn from(signal: &ReadSignal<T>) -> Self {
        Child::from(signal.clone())
    }
}

impl<T: Display + 'static> From<Signal<T>> for Child {
    fn from(signal: Signal<T>) -> Self {
        Child::reactive(move || signal.with(ToString::to_string))
    }
}

impl<T: Display + Clone + PartialEq + 'static> From<Memo<T>> for Child {
    fn from(memo: Memo<T>) -> Self {
        Child::reactive(move || memo.with(ToString::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::set_signal;

    #[test]
    fn empty_values_convert_to_empty() {
        assert!(Child::from(()).is_empty());
        assert!(Child::from(false).is_empty());
        assert!(Child::from(true).is_empty());
        assert!(Child::from(None::<&str>).is_empty());
        assert!(Child::from(vec![Child::Empty, Child::from(())]).is_empty());
    }

    #[test]
    fn scalars_convert_to_text() {
        assert!(matches!(Child::from(42i32), Child::Text(t) if t == "42"));
        assert!(matches!(Child::from(1.5f64), Child::Text(t) if t == "1.5"));
        assert!(matches!(Child::from(Some("x")), Child::Text(t) if t == "x"));
    }

    #[test]
    fn signals_convert_to_reactive_children() {
        let (count, set_count) = set_signal(1);
        let child = Child::from(&count);

        let Child::Reactive(render) = child else {
            panic!("expected a reactive child");
        };
        assert!(matches!(render(), Child::Text(t) if t == "1"));
        set_count.set(2);
        assert!(matches!(render(), Child::Text(t) if t == "2"));
    }
}
