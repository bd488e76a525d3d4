//! Render options.

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use crate::dom::Node;

/// Hook run against the root after the tree is built, before it is attached.
pub type BeforeRender = Rc<dyn Fn(&Node)>;

/// How [`render`](super::render) mounts a tree.
///
/// The data fields can be loaded from JSON:
///
/// ```rust
/// use olova_core::RenderOptions;
///
/// let options = RenderOptions::from_json(r#"{ "hydrate": true }"#).unwrap();
/// assert!(options.hydrate);
/// assert!(options.clear);
/// ```
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RenderOptions {
    /// Remove existing root content before attaching. Ignored when hydrating.
    pub clear: bool,

    /// Reuse the nodes already in the root instead of replacing them.
    pub hydrate: bool,

    #[serde(skip)]
    pub before_render: Option<BeforeRender>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn with_hydrate(mut self, hydrate: bool) -> Self {
        self.hydrate = hydrate;
        self
    }

    pub fn on_before_render(mut self, f: impl Fn(&Node) + 'static) -> Self {
        self.before_render = Some(Rc::new(f));
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            clear: true,
            hydrate: false,
            before_render: None,
        }
    }
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("clear", &self.clear)
            .field("hydrate", &self.hydrate)
            .field("before_render", &self.before_render.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_clear_without_hydrating() {
        let options = RenderOptions::default();
        assert!(options.clear);
        assert!(!options.hydrate);
        assert!(options.before_render.is_none());
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let options = RenderOptions::from_json(r#"{ "clear": false }"#).unwrap();
        assert!(!options.clear);
        assert!(!options.hydrate);

        let options = RenderOptions::from_json("{}").unwrap();
        assert!(options.clear);
    }

    #[test]
    fn json_rejects_unknown_fields() {
        assert!(RenderOptions::from_json(r#"{ "beforeRender": 1 }"#).is_err());
        assert!(RenderOptions::from_json(r#"{ "clear": "yes" }"#).is_err());
    }

    #[test]
    fn builders_set_fields() {
        let options = RenderOptions::new()
            .with_clear(false)
            .with_hydrate(true)
            .on_before_render(|_| {});
        assert!(!options.clear);
        assert!(options.hydrate);
        assert!(options.before_render.is_some());
        assert_eq!(
            format!("{options:?}"),
            "RenderOptions { clear: false, hydrate: true, before_render: true }"
        );
    }
}
