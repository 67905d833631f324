//! Read-only view of a parsed XML element

use std::borrow::Cow;

use crate::xml::model::Element;

/// The capabilities the normalizer needs from an XML tree node.
///
/// Implemented for the engine's [`Element`]; any other tree can be
/// normalized by implementing it.
pub trait XmlNode {
    /// Qualified name as written in the source (`prefix:local` or `local`)
    fn name(&self) -> &str;

    /// Namespace URI the element's name resolves to
    fn namespace_uri(&self) -> Option<&str>;

    /// Attributes as `(qualified name, value)` pairs in source order,
    /// excluding namespace declarations
    fn attributes(&self) -> impl Iterator<Item = (&str, &str)>;

    /// Child elements in document order
    fn child_elements(&self) -> impl Iterator<Item = &Self>;

    /// Concatenation of the element's direct text nodes
    fn direct_text(&self) -> Cow<'_, str>;

    fn prefix(&self) -> Option<&str> {
        self.name().split_once(':').map(|(prefix, _)| prefix)
    }

    fn local_name(&self) -> &str {
        let name = self.name();
        name.split_once(':').map_or(name, |(_, local)| local)
    }

    /// Key the element is stored under in its parent's mapping
    fn effective_key(&self) -> String {
        match self.prefix() {
            Some(prefix) => format!("{prefix}:{}", self.local_name()),
            None => self.local_name().to_string(),
        }
    }

    fn has_child_elements(&self) -> bool {
        self.child_elements().next().is_some()
    }
}

impl XmlNode for Element {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace_uri(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    fn child_elements(&self) -> impl Iterator<Item = &Self> {
        self.elements()
    }

    fn direct_text(&self) -> Cow<'_, str> {
        Cow::Owned(self.text())
    }
}
