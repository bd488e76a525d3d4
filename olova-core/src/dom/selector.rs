//! Simple selectors: an optional tag, an optional `#id` and any number of
//! `.class` parts, e.g. `div#app.main`. Combinators are not supported.

use super::node::Node;
use crate::error::DomError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    pub(crate) fn parse(input: &str) -> Result<Self, DomError> {
        let invalid = || DomError::InvalidSelector(input.to_string());
        let input_trimmed = input.trim();
        if input_trimmed.is_empty() || input_trimmed.contains(char::is_whitespace) {
            return Err(invalid());
        }

        let mut selector = Selector::default();
        let mut rest = input_trimmed;

        let tag_end = rest.find(['#', '.']).unwrap_or(rest.len());
        if tag_end > 0 {
            selector.tag = Some(rest[..tag_end].to_ascii_lowercase());
        }
        rest = &rest[tag_end..];

        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return Err(invalid());
            }
            match marker {
                '#' if selector.id.is_none() => selector.id = Some(name.to_string()),
                '.' => selector.classes.push(name.to_string()),
                _ => return Err(invalid()),
            }
            rest = &body[end..];
        }

        Ok(selector)
    }

    pub(crate) fn matches(&self, node: &Node) -> bool {
        let Some(tag) = node.tag_name() else {
            return false;
        };
        if self.tag.as_ref().is_some_and(|wanted| *wanted != tag) {
            return false;
        }
        if let Some(id) = &self.id {
            if node.get_attribute("id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class = node.class_name().unwrap_or_default();
            let present: Vec<&str> = class.split_whitespace().collect();
            if !self.classes.iter().all(|c| present.contains(&c.as_str())) {
                return false;
            }
        }
        true
    }
}
