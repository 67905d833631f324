//! XML to [`Value`] normalization
//!
//! The root element's tag is dropped; its children, attributes and text are
//! folded into one [`Mapping`]:
//!
//! - a child element is stored under its qualified name (`ns:message`),
//!   repeated siblings are grouped into a [`Sequence`](crate::Sequence)
//!   through [`Mapping::merge_child`];
//! - attributes are stored under `@name`;
//! - an element without children or attributes collapses to its text,
//!   `Null` when that text is empty or whitespace only;
//! - a childless element with attributes keeps its text under `#text`.

use tracing::debug;

use crate::error::{Error, Result};
use crate::format::Format;
use crate::value::{Mapping, Value};
use crate::xml::{self, XmlNode};

/// Key holding the text of an element that also carries attributes
pub const TEXT_KEY: &str = "#text";

/// Prefix for attribute keys
pub const ATTRIBUTE_PREFIX: char = '@';

/// Where integer-looking text is turned into [`Value::Integer`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegerCoercion {
    /// Attribute values and single leaf children are coerced; leaf children
    /// grouped into a sequence keep their text.
    #[default]
    Positional,
    /// Attribute values and every leaf child, grouped or not
    Everywhere,
    /// Everything stays text
    Disabled,
}

/// Normalizer configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub coercion: IntegerCoercion,
    pub parser: xml::Config,
}

/// Normalize an XML document with the default configuration
pub fn normalize(input: &str) -> Result<Value> {
    Normalizer::default().normalize(input)
}

/// Converts XML documents into [`Value`]s
#[derive(Clone, Copy, Debug, Default)]
pub struct Normalizer {
    config: Config,
}

impl Normalizer {
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Parse `input` and normalize its root element.
    ///
    /// A leading byte order mark is ignored. Empty or whitespace-only input
    /// yields an empty mapping. Anything the XML engine rejects fails with
    /// "Failed To Parse XML".
    pub fn normalize(&self, input: &str) -> Result<Value> {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        if is_blank(input) {
            return Ok(Value::Mapping(Mapping::new()));
        }

        let document = xml::Parser::with_config(input.as_bytes(), self.config.parser)
            .parse()
            .map_err(|err| {
                debug!(error = %err, "rejected xml payload");
                Error::malformed(Format::Xml, &err, err.span())
            })?;

        Ok(self.normalize_element(&document.root))
    }

    /// Normalize one element and everything below it
    pub fn normalize_element<N: XmlNode>(&self, element: &N) -> Value {
        let mut result = Mapping::new();
        for child in element.child_elements() {
            result.merge_child(child.effective_key(), self.normalize_element(child));
        }
        self.coerce_children(&mut result);

        let mut has_attributes = false;
        for (name, value) in element.attributes() {
            has_attributes = true;
            result.insert(format!("{ATTRIBUTE_PREFIX}{name}"), self.coerce(value));
        }

        let text = normalize_text(&element.direct_text());
        if result.is_empty() {
            return text;
        }
        if has_attributes && !element.has_child_elements() {
            if let Value::String(text) = text {
                result.insert(TEXT_KEY, text);
            }
        }
        Value::Mapping(result)
    }

    /// Children are merged before this runs, so every bare string in
    /// `mapping` is the text of a leaf child.
    fn coerce_children(&self, mapping: &mut Mapping) {
        if self.config.coercion == IntegerCoercion::Disabled {
            return;
        }
        for (_, value) in mapping.iter_mut() {
            match value {
                Value::String(text) => {
                    if let Some(n) = parse_integer(text) {
                        *value = Value::Integer(n);
                    }
                }
                Value::Sequence(items) if self.config.coercion == IntegerCoercion::Everywhere => {
                    for item in &mut items.0 {
                        if let Some(n) = item.as_string().and_then(parse_integer) {
                            *item = Value::Integer(n);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn coerce(&self, text: &str) -> Value {
        match self.config.coercion {
            IntegerCoercion::Disabled => Value::String(text.to_string()),
            _ => parse_integer(text).map_or_else(|| Value::String(text.to_string()), Value::Integer),
        }
    }
}

/// Whitespace-only text becomes `Null`; anything else is kept verbatim,
/// including surrounding whitespace.
pub fn normalize_text(text: &str) -> Value {
    if is_blank(text) {
        Value::Null
    } else {
        Value::String(text.to_string())
    }
}

fn is_blank(text: &str) -> bool {
    text.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}

/// Parse canonical decimal integers: an optional `-`, no redundant leading
/// zeros, within `i64`.
pub fn parse_integer(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let canonical = match digits.as_bytes() {
        [] => false,
        [b'0'] => digits.len() == text.len(),
        [first, rest @ ..] => {
            first.is_ascii_digit() && *first != b'0' && rest.iter().all(u8::is_ascii_digit)
        }
    };
    if canonical {
        text.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    /// A minimal tree, independent of the XML engine
    struct Node {
        name: &'static str,
        attributes: Vec<(String, String)>,
        children: Vec<Node>,
        text: &'static str,
    }

    impl Node {
        fn leaf(name: &'static str, text: &'static str) -> Self {
            Self {
                name,
                attributes: Vec::new(),
                children: Vec::new(),
                text,
            }
        }
    }

    impl XmlNode for Node {
        fn name(&self) -> &str {
            self.name
        }

        fn namespace_uri(&self) -> Option<&str> {
            None
        }

        fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
            self.attributes
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()))
        }

        fn child_elements(&self) -> impl Iterator<Item = &Self> {
            self.children.iter()
        }

        fn direct_text(&self) -> Cow<'_, str> {
            Cow::Borrowed(self.text)
        }
    }

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn mapping(entries: Vec<(&str, Value)>) -> Value {
        Value::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn test_walk_over_custom_node() {
        let root = Node {
            name: "root",
            attributes: attrs(&[("name", "root")]),
            children: vec![
                Node::leaf("d", ""),
                Node::leaf("d", "1"),
                Node::leaf("p:e", "7"),
            ],
            text: "\n  ",
        };

        let value = Normalizer::default().normalize_element(&root);
        assert_eq!(
            value,
            mapping(vec![
                ("d", Value::from(vec![Value::Null, Value::from("1")])),
                ("p:e", Value::Integer(7)),
                ("@name", Value::from("root")),
            ])
        );
    }

    #[test]
    fn test_leaf_with_attribute_keeps_text() {
        let node = Node {
            name: "Author",
            attributes: attrs(&[("id", "18")]),
            children: Vec::new(),
            text: "Author #1",
        };
        assert_eq!(
            Normalizer::default().normalize_element(&node),
            mapping(vec![
                ("@id", Value::Integer(18)),
                ("#text", Value::from("Author #1")),
            ])
        );
    }

    #[test]
    fn test_leaf_with_attribute_and_blank_text() {
        let node = Node {
            name: "d",
            attributes: attrs(&[("id", "x")]),
            children: Vec::new(),
            text: "   ",
        };
        assert_eq!(
            Normalizer::default().normalize_element(&node),
            mapping(vec![("@id", Value::from("x"))])
        );
    }

    #[test]
    fn test_text_beside_children_is_not_emitted() {
        let node = Node {
            name: "a",
            attributes: attrs(&[("k", "v")]),
            children: vec![Node::leaf("b", "x")],
            text: "loose",
        };
        let value = Normalizer::default().normalize_element(&node);
        assert_eq!(value.get_path("#text"), None);
        assert_eq!(value.get_path("b"), Some(&Value::from("x")));
    }

    #[test]
    fn test_coercion_modes() {
        let root = Node {
            name: "root",
            attributes: attrs(&[("id", "2")]),
            children: vec![
                Node::leaf("n", "1"),
                Node::leaf("n", "2"),
                Node::leaf("s", "3"),
            ],
            text: "",
        };

        let everywhere = Normalizer::new(Config {
            coercion: IntegerCoercion::Everywhere,
            ..Config::default()
        });
        assert_eq!(
            everywhere.normalize_element(&root).get_path("n"),
            Some(&Value::from(vec![Value::Integer(1), Value::Integer(2)]))
        );

        let disabled = Normalizer::new(Config {
            coercion: IntegerCoercion::Disabled,
            ..Config::default()
        });
        let value = disabled.normalize_element(&root);
        assert_eq!(value.get_path("s"), Some(&Value::from("3")));
        assert_eq!(value.get_path("@id"), Some(&Value::from("2")));
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("123"), Some(123));
        assert_eq!(parse_integer("-45"), Some(-45));
        assert_eq!(parse_integer("0"), Some(0));
        assert_eq!(parse_integer("007"), None);
        assert_eq!(parse_integer("-0"), None);
        assert_eq!(parse_integer("+5"), None);
        assert_eq!(parse_integer(" 5"), None);
        assert_eq!(parse_integer("1.5"), None);
        assert_eq!(parse_integer(""), None);
        assert_eq!(parse_integer("-"), None);
        assert_eq!(parse_integer("99999999999999999999"), None);
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text(""), Value::Null);
        assert_eq!(normalize_text(" \t\r\n "), Value::Null);
        assert_eq!(normalize_text("  x  "), Value::from("  x  "));
    }
}
