/// Build a `Vec<Child>` from values convertible into [`Child`](crate::Child).
///
/// ```rust
/// use olova_core::{children, html, Props};
///
/// let items = vec!["a", "b"];
/// let node = html("p", Props::new(), children!["x", 1i32, items, None::<&str>]);
/// assert_eq!(node.to_html(), "<p>x1ab</p>");
/// ```
#[macro_export]
macro_rules! children {
    () => {
        ::std::vec::Vec::<$crate::Child>::new()
    };
    ($($child:expr),+ $(,)?) => {
        ::std::vec![$($crate::Child::from($child)),+]
    };
}

/// Clone variables into a move closure.
///
/// ```rust
/// use olova_core::{cloned, set_effect, set_signal};
///
/// let (count, set_count) = set_signal(0);
/// set_effect(cloned!(count => move || println!("{}", count.get())));
/// set_count.set(1);
/// ```
#[macro_export]
macro_rules! cloned {
    ($($name:ident),+ => $body:expr) => {{
        $( let $name = $name.clone(); )+
        $body
    }};
}
