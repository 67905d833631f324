//! XML data model

use indexmap::IndexMap;

/// XML document
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub root: Element,
}

/// XML element
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Element {
    /// Qualified name as written, `prefix:local` or `local`
    pub name: String,
    /// Namespace URI bound to the element's prefix (or the default namespace)
    pub namespace: Option<String>,
    /// Attributes in source order, keyed by qualified name. Namespace
    /// declarations are kept apart in `namespaces`.
    pub attributes: IndexMap<String, String>,
    /// Namespace declarations made on this element; the default namespace
    /// is stored under the empty prefix
    pub namespaces: IndexMap<String, String>,
    pub children: Vec<Content>,
}

/// XML content node
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Element(Element),
    /// Character data, including CDATA sections, with entities decoded
    Text(String),
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|child| match child {
            Content::Element(element) => Some(element),
            Content::Text(_) => None,
        })
    }

    /// Concatenation of the element's own text nodes
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Content::Text(text) => Some(text.as_str()),
                Content::Element(_) => None,
            })
            .collect()
    }
}
