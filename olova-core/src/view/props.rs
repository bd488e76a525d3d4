//! Element properties.
//!
//! Props are set by string key, the way a JSX transform would emit them, and
//! classified into [`Prop`] when the element is built:
//!
//! | key                         | becomes                                  |
//! |-----------------------------|------------------------------------------|
//! | `className`, `class`        | the `class` attribute                    |
//! | `style`                     | the `style` attribute (map or raw text)  |
//! | `dangerouslySetInnerHTML`   | raw inner markup; children are ignored   |
//! | `ref`                       | a [`RefTarget`] binding                  |
//! | `on<Name>`                  | a listener for the `<name>` event        |
//! | anything else               | a plain attribute                        |

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::node_ref::{NodeRef, RefTarget};
use crate::dom::{Event, EventHandler};
use crate::error::PropError;

/// An inline style: a declaration map or a raw CSS string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Style {
    /// camelCase or kebab-case property names to values.
    Declarations(IndexMap<String, String>),
    Raw(String),
}

impl Style {
    /// Start an empty declaration map.
    pub fn new() -> Self {
        Style::Declarations(IndexMap::new())
    }

    /// Add a declaration. On a raw style the declaration is appended.
    pub fn set(self, property: impl Into<String>, value: impl Into<String>) -> Self {
        match self {
            Style::Declarations(mut map) => {
                map.insert(property.into(), value.into());
                Style::Declarations(map)
            }
            Style::Raw(raw) => {
                let declaration = format!("{}: {};", kebab_case(&property.into()), value.into());
                if raw.trim().is_empty() {
                    Style::Raw(declaration)
                } else {
                    Style::Raw(format!("{} {}", raw.trim_end(), declaration))
                }
            }
        }
    }

    /// Render as the value of a `style` attribute.
    pub fn to_css(&self) -> String {
        match self {
            Style::Raw(raw) => raw.clone(),
            Style::Declarations(map) => map
                .iter()
                .map(|(property, value)| format!("{}: {};", kebab_case(property), value))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Style {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Style::Declarations(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// `backgroundColor` → `background-color`. Custom properties are untouched.
fn kebab_case(property: &str) -> String {
    if property.starts_with("--") {
        return property.to_string();
    }
    let mut out = String::with_capacity(property.len() + 4);
    for c in property.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// A value stored under a prop key.
#[derive(Clone)]
pub enum PropValue {
    Text(String),
    /// An integer, kept exact.
    Integer(i128),
    Number(f64),
    Bool(bool),
    Style(Style),
    /// Raw markup, for `dangerouslySetInnerHTML`.
    Html(String),
    Ref(RefTarget),
    Handler(EventHandler),
}

impl PropValue {
    fn kind(&self) -> &'static str {
        match self {
            PropValue::Text(_) => "text",
            PropValue::Integer(_) | PropValue::Number(_) => "number",
            PropValue::Bool(_) => "bool",
            PropValue::Style(_) => "style",
            PropValue::Html(_) => "html",
            PropValue::Ref(_) => "ref",
            PropValue::Handler(_) => "handler",
        }
    }

    pub fn handler(f: impl Fn(&Event) + 'static) -> Self {
        PropValue::Handler(Rc::new(f))
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            PropValue::Text(text) => Some(text.clone()),
            PropValue::Integer(n) => Some(n.to_string()),
            PropValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<EventHandler> {
        match self {
            PropValue::Handler(handler) => Some(handler.clone()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            PropValue::Integer(n) => f.debug_tuple("Integer").field(n).finish(),
            PropValue::Number(n) => f.debug_tuple("Number").field(n).finish(),
            PropValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            PropValue::Style(style) => f.debug_tuple("Style").field(style).finish(),
            PropValue::Html(html) => f.debug_tuple("Html").field(html).finish(),
            PropValue::Ref(target) => f.debug_tuple("Ref").field(target).finish(),
            PropValue::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

macro_rules! prop_value_from_number {
    ($variant:ident as $repr:ty: $($ty:ty),*) => {
        $(
            impl From<$ty> for PropValue {
                fn from(value: $ty) -> Self {
                    PropValue::$variant(<$repr>::from(value))
                }
            }
        )*
    };
}

prop_value_from_number!(Integer as i128: i8, i16, i32, i64, u8, u16, u32, u64);
prop_value_from_number!(Number as f64: f32, f64);

impl From<isize> for PropValue {
    fn from(value: isize) -> Self {
        PropValue::Integer(value as i128)
    }
}

impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        PropValue::Integer(value as i128)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Text(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<Style> for PropValue {
    fn from(value: Style) -> Self {
        PropValue::Style(value)
    }
}

impl From<RefTarget> for PropValue {
    fn from(value: RefTarget) -> Self {
        PropValue::Ref(value)
    }
}

impl From<NodeRef> for PropValue {
    fn from(value: NodeRef) -> Self {
        PropValue::Ref(RefTarget::Slot(value))
    }
}

impl From<&NodeRef> for PropValue {
    fn from(value: &NodeRef) -> Self {
        PropValue::Ref(RefTarget::Slot(value.clone()))
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        PropValue::Handler(value)
    }
}

/// Attribute value after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Integer(i128),
    Number(f64),
    Bool(bool),
}

impl AttrValue {
    /// The attribute text, or `None` when the attribute should be absent.
    pub fn render(&self) -> Option<String> {
        match self {
            AttrValue::Text(text) => Some(text.clone()),
            AttrValue::Integer(n) => Some(n.to_string()),
            AttrValue::Number(n) => Some(n.to_string()),
            AttrValue::Bool(true) => Some(String::new()),
            AttrValue::Bool(false) => None,
        }
    }
}

/// A classified prop.
#[derive(Clone)]
pub enum Prop {
    Class(String),
    Style(Style),
    InnerHtml(String),
    Ref(RefTarget),
    /// Listener for the lowercase event name.
    Event { name: String, handler: EventHandler },
    Attribute { name: String, value: AttrValue },
}

impl fmt::Debug for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prop::Class(class) => f.debug_tuple("Class").field(class).finish(),
            Prop::Style(style) => f.debug_tuple("Style").field(style).finish(),
            Prop::InnerHtml(html) => f.debug_tuple("InnerHtml").field(html).finish(),
            Prop::Ref(target) => f.debug_tuple("Ref").field(target).finish(),
            Prop::Event { name, .. } => f.debug_struct("Event").field("name", name).finish(),
            Prop::Attribute { name, value } => f
                .debug_struct("Attribute")
                .field("name", name)
                .field("value", value)
                .finish(),
        }
    }
}

/// `onClick` → `Some("click")`. `on` and `one` are not event keys.
fn event_name(key: &str) -> Option<String> {
    let rest = key.strip_prefix("on")?;
    let first = rest.chars().next()?;
    first
        .is_ascii_uppercase()
        .then(|| rest.to_ascii_lowercase())
}

impl Prop {
    /// Classify a key/value pair.
    pub fn classify(key: &str, value: PropValue) -> Result<Prop, PropError> {
        let mismatch = |expected: &'static str, value: &PropValue| PropError::InvalidType {
            key: key.to_string(),
            expected,
            found: value.kind(),
        };

        match key {
            "className" | "class" => match value {
                PropValue::Text(class) => Ok(Prop::Class(class)),
                PropValue::Integer(n) => Ok(Prop::Class(n.to_string())),
                PropValue::Number(n) => Ok(Prop::Class(n.to_string())),
                other => Err(mismatch("text", &other)),
            },
            "style" => match value {
                PropValue::Style(style) => Ok(Prop::Style(style)),
                PropValue::Text(raw) => Ok(Prop::Style(Style::Raw(raw))),
                other => Err(mismatch("a style map or text", &other)),
            },
            "dangerouslySetInnerHTML" => match value {
                PropValue::Html(html) | PropValue::Text(html) => Ok(Prop::InnerHtml(html)),
                other => Err(mismatch("markup", &other)),
            },
            "ref" => match value {
                PropValue::Ref(target) => Ok(Prop::Ref(target)),
                other => Err(mismatch("a ref", &other)),
            },
            _ => {
                if let Some(name) = event_name(key) {
                    return match value {
                        PropValue::Handler(handler) => Ok(Prop::Event { name, handler }),
                        other => Err(mismatch("an event handler", &other)),
                    };
                }
                let value = match value {
                    PropValue::Text(text) => AttrValue::Text(text),
                    PropValue::Integer(n) => AttrValue::Integer(n),
                    PropValue::Number(n) => AttrValue::Number(n),
                    PropValue::Bool(b) => AttrValue::Bool(b),
                    other => return Err(mismatch("text, number or bool", &other)),
                };
                Ok(Prop::Attribute {
                    name: key.to_string(),
                    value,
                })
            }
        }
    }
}

/// Ordered props passed to `html` and to components.
#[derive(Debug, Clone, Default)]
pub struct Props {
    entries: IndexMap<String, PropValue>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`. A later set of the same key wins.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.set("className", PropValue::Text(class.into()))
    }

    pub fn style(self, style: impl Into<PropValue>) -> Self {
        self.set("style", style)
    }

    pub fn attr(self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.set(name, value)
    }

    /// Listen for `event` (`"click"` sets the `onClick` key).
    pub fn on(self, event: &str, f: impl Fn(&Event) + 'static) -> Self {
        let mut chars = event.chars();
        let key = match chars.next() {
            Some(first) => format!("on{}{}", first.to_ascii_uppercase(), chars.as_str()),
            None => "on".to_string(),
        };
        self.set(key, PropValue::handler(f))
    }

    pub fn node_ref(self, target: impl Into<RefTarget>) -> Self {
        self.set("ref", PropValue::Ref(target.into()))
    }

    pub fn inner_html(self, markup: impl Into<String>) -> Self {
        self.set("dangerouslySetInnerHTML", PropValue::Html(markup.into()))
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.entries.get(key)
    }

    /// Text (or number) stored under `key`.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(PropValue::as_text)
    }

    pub fn handler(&self, key: &str) -> Option<EventHandler> {
        self.get(key).and_then(PropValue::as_handler)
    }

    pub fn remove(&mut self, key: &str) -> Option<PropValue> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for Props {
    type Item = (String, PropValue);
    type IntoIter = indexmap::map::IntoIter<String, PropValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<PropValue>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
