//! reqparse - request payload normalizer
//!
//! Turns XML, JSON and form-urlencoded request bodies into one canonical
//! [`Value`]. The XML side is the interesting part: element names,
//! attributes, namespaced names, repeated siblings and mixed text are all
//! encoded into plain mappings and sequences, so callers need no XML
//! knowledge downstream.
//!
//! # Quick Start
//!
//! ```
//! use reqparse::{from_xml_str, Value};
//! # fn main() -> Result<(), reqparse::Error> {
//! let value = from_xml_str("<xml><status>123</status><message>hello world</message></xml>")?;
//! assert_eq!(value.get_path("status"), Some(&Value::Integer(123)));
//! assert_eq!(value.get_path("message").and_then(Value::as_string), Some("hello world"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod input;
pub use input::Payload;

pub mod value;
pub use value::{Mapping, Sequence, Value};

pub mod format;
pub use format::{detect_format, detect_format_from_path, detect_format_or_default, Format};

pub mod json;
pub mod normalize;
pub mod payload;
pub mod query;
pub mod xml;
pub use normalize::{normalize, Config, IntegerCoercion, Normalizer};
pub use payload::PayloadParser;
pub use xml::{Document as XmlDocument, Element as XmlElement, Parser as XmlParser, XmlNode};

/// Normalize an XML document into a [`Value`]
pub fn from_xml_str(s: &str) -> Result<Value> {
    normalize(s)
}

/// Normalize an XML document from bytes
pub fn from_xml_bytes(bytes: &[u8]) -> Result<Value> {
    PayloadParser::default().parse_as(Format::Xml, bytes)
}

/// Parse a JSON document into a [`Value`]
pub fn from_json_str(s: &str) -> Result<Value> {
    json::parse(s)
}

/// Parse a query string into a [`Value`]
pub fn from_query_str(s: &str) -> Result<Value> {
    query::parse(s)
}

/// Parse a request body, choosing the format from its content type
pub fn parse_payload(content_type: Option<&str>, body: &[u8]) -> Result<Value> {
    let payload = match content_type {
        Some(content_type) => Payload::from_bytes(body).with_content_type(content_type),
        None => Payload::from_bytes(body),
    };
    PayloadParser::default().parse(&payload)
}
