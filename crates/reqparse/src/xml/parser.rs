//! XML parser implementation

use std::borrow::Cow;

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Result, Span};
use crate::xml::cursor::Cursor;
use crate::xml::model::{Content, Document, Element};

/// Default maximum element nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 256;

const XMLNS: &str = "xmlns";
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Parser limits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth; the root element is depth 1
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
    /// In-scope namespace declarations, innermost last
    scopes: Vec<IndexMap<String, String>>,
}

impl<'a> Parser<'a> {
    pub const fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config {
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    pub const fn with_config(input: &'a [u8], config: Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
            scopes: Vec::new(),
        }
    }

    /// Parse a complete XML document
    pub fn parse(&mut self) -> Result<Document> {
        self.skip_misc(true)?;
        let root = self.parse_element(1)?;
        self.skip_misc(false)?;

        if !self.cursor.is_eof() {
            return Err(Error::at(ErrorKind::TrailingContent, self.cursor.position()));
        }

        Ok(Document { root })
    }

    /// Skip whitespace, comments and processing instructions around the
    /// root element; a DOCTYPE is accepted only before it.
    fn skip_misc(&mut self, mut allow_doctype: bool) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if allow_doctype && self.cursor.starts_with(b"<!DOCTYPE") {
                self.skip_doctype()?;
                allow_doctype = false;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_element(&mut self, depth: usize) -> Result<Element> {
        if depth > self.config.max_depth {
            return Err(Error::at(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                self.cursor.position(),
            ));
        }

        self.expect_byte(b'<')?;
        let name = self.parse_name()?;
        let (attributes, namespaces) = self.parse_attributes()?;

        self.scopes.push(namespaces);
        let result = self.parse_element_rest(name, attributes, depth);
        let namespaces = self.scopes.pop().unwrap_or_default();

        result.map(|mut element| {
            element.namespaces = namespaces;
            element
        })
    }

    fn parse_element_rest(
        &mut self,
        name: String,
        attributes: IndexMap<String, String>,
        depth: usize,
    ) -> Result<Element> {
        let namespace = self.resolve_prefix(prefix_of(&name)).map(str::to_string);
        let mut element = Element {
            name,
            namespace,
            attributes,
            ..Element::default()
        };

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
            return Ok(element);
        }
        self.expect_byte(b'>')?;

        loop {
            if self.cursor.starts_with(b"</") {
                let start = self.cursor.position();
                self.cursor.advance_by(2);
                let close_name = self.parse_name()?;
                if close_name != element.name {
                    return Err(Error::new(
                        ErrorKind::MismatchedTag {
                            expected: element.name,
                            found: close_name,
                        },
                        Span::new(start, self.cursor.position()),
                    ));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;
                return Ok(element);
            }

            if self.cursor.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.cursor.starts_with(b"<![CDATA[") {
                let text = self.parse_cdata()?;
                push_text(&mut element.children, text);
            } else if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.starts_with(b"<!") {
                return Err(self.error_here("unexpected markup declaration"));
            } else if self.cursor.current() == Some(b'<') {
                let child = self.parse_element(depth + 1)?;
                element.children.push(Content::Element(child));
            } else if self.cursor.is_eof() {
                return Err(Error::with_message(
                    ErrorKind::UnexpectedEof,
                    Span::at(self.cursor.position()),
                    format!("unterminated element <{}>", element.name),
                ));
            } else {
                let text = self.parse_text()?;
                push_text(&mut element.children, text);
            }
        }
    }

    /// Returns regular attributes and namespace declarations separately
    #[allow(clippy::type_complexity)]
    fn parse_attributes(
        &mut self,
    ) -> Result<(IndexMap<String, String>, IndexMap<String, String>)> {
        let mut attrs = IndexMap::new();
        let mut namespaces = IndexMap::new();

        loop {
            let had_space = matches!(
                self.cursor.current(),
                Some(b' ' | b'\t' | b'\r' | b'\n')
            );
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/' | b'>') => break,
                Some(_) if !had_space => {
                    return Err(self.error_here("expected whitespace before attribute"));
                }
                Some(_) => {}
                None => return Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position())),
            }

            let start = self.cursor.position();
            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            let declared = if name == XMLNS {
                Some(String::new())
            } else {
                name.strip_prefix("xmlns:").map(str::to_string)
            };

            let duplicate = match declared {
                Some(prefix) => namespaces.insert(prefix, value).is_some(),
                None => attrs.insert(name.clone(), value).is_some(),
            };
            if duplicate {
                return Err(Error::new(
                    ErrorKind::DuplicateAttribute { name },
                    Span::new(start, self.cursor.position()),
                ));
            }
        }

        Ok((attrs, namespaces))
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => return Err(self.error_here("expected quoted attribute value")),
        };
        self.cursor.advance();

        let start = self.cursor.pos();
        let start_pos = self.cursor.position();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                let span = Span::new(start_pos, self.cursor.position());
                self.cursor.advance();
                let text = bytes_to_string(raw)?;
                check_chars(&text, span)?;
                // literal whitespace in attribute values normalizes to spaces
                let text = normalize_line_endings(&text).replace(['\t', '\n'], " ");
                return decode_entities(&text);
            }
            if b == b'<' {
                return Err(self.error_here("'<' not allowed in attribute value"));
            }
            self.cursor.advance();
        }

        Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position()))
    }

    fn parse_text(&mut self) -> Result<String> {
        let start = self.cursor.pos();
        let start_pos = self.cursor.position();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let raw = self.cursor.slice_from(start);
        let span = Span::new(start_pos, self.cursor.position());
        let text = bytes_to_string(raw)?;
        if text.contains("]]>") {
            return Err(Error::with_message(
                ErrorKind::InvalidToken,
                span,
                "']]>' not allowed in character data",
            ));
        }
        check_chars(&text, span)?;
        decode_entities(&normalize_line_endings(&text))
    }

    fn parse_cdata(&mut self) -> Result<String> {
        self.cursor.advance_by(b"<![CDATA[".len());
        let start = self.cursor.pos();
        let start_pos = self.cursor.position();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(b"]]>") {
                let raw = self.cursor.slice_from(start);
                let span = Span::new(start_pos, self.cursor.position());
                self.cursor.advance_by(3);
                let text = bytes_to_string(raw)?;
                check_chars(&text, span)?;
                return Ok(normalize_line_endings(&text).into_owned());
            }
            self.cursor.advance();
        }
        Err(Error::with_message(
            ErrorKind::UnexpectedEof,
            Span::at(self.cursor.position()),
            "unterminated CDATA section",
        ))
    }

    fn parse_name(&mut self) -> Result<String> {
        let start = self.cursor.pos();
        let start_pos = self.cursor.position();

        match self.cursor.current() {
            Some(first) if is_name_start(first) => self.cursor.advance(),
            Some(_) => return Err(Error::at(ErrorKind::InvalidToken, self.cursor.position())),
            None => return Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position())),
        }

        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        let name = bytes_to_string(self.cursor.slice_from(start))?;
        if let Some((prefix, local)) = name.split_once(':') {
            if prefix.is_empty() || local.is_empty() {
                return Err(Error::with_message(
                    ErrorKind::InvalidToken,
                    Span::new(start_pos, self.cursor.position()),
                    format!("invalid qualified name '{name}'"),
                ));
            }
        }
        Ok(name)
    }

    fn resolve_prefix(&self, prefix: Option<&str>) -> Option<&str> {
        let key = prefix.unwrap_or_default();
        if key == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(key))
            .map(String::as_str)
            .filter(|uri| !uri.is_empty())
    }

    fn skip_comment(&mut self) -> Result<()> {
        self.cursor.advance_by(4);
        self.skip_until(b"-->")
    }

    fn skip_processing_instruction(&mut self) -> Result<()> {
        self.cursor.advance_by(2);
        self.skip_until(b"?>")
    }

    fn skip_doctype(&mut self) -> Result<()> {
        // an internal subset may itself contain '>' inside its brackets
        let mut in_subset = false;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match b {
                b'[' => in_subset = true,
                b']' => in_subset = false,
                b'>' if !in_subset => return Ok(()),
                _ => {}
            }
        }
        Err(self.error_here("unterminated DOCTYPE"))
    }

    fn skip_until(&mut self, pattern: &[u8]) -> Result<()> {
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                self.cursor.advance_by(pattern.len());
                return Ok(());
            }
            self.cursor.advance();
        }
        Err(self.error_here("unterminated markup"))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else if self.cursor.is_eof() {
            Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position()))
        } else {
            Err(self.error_here(&format!("expected '{}'", char::from(expected))))
        }
    }

    fn error_here(&self, message: &str) -> Error {
        Error::with_message(
            ErrorKind::InvalidToken,
            Span::at(self.cursor.position()),
            message,
        )
    }
}

/// Adjacent text and CDATA nodes are kept as a single text node
fn push_text(children: &mut Vec<Content>, text: String) {
    if let Some(Content::Text(last)) = children.last_mut() {
        last.push_str(&text);
    } else {
        children.push(Content::Text(text));
    }
}

/// `\r\n` and lone `\r` become `\n`
fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// The XML `Char` production
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn check_chars(text: &str, span: Span) -> Result<()> {
    match text.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(Error::with_message(
            ErrorKind::InvalidToken,
            span,
            format!("invalid character U+{:04X}", u32::from(c)),
        )),
        None => Ok(()),
    }
}

fn prefix_of(name: &str) -> Option<&str> {
    name.split_once(':').map(|(prefix, _)| prefix)
}

fn bytes_to_string(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| Error::new(ErrorKind::InvalidUtf8, Span::empty()))
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entities(input: &str) -> Result<String> {
    if !input.contains('&') {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        let (before, after) = rest.split_at(amp);
        result.push_str(before);

        let Some(end) = after.find(';') else {
            return Err(Error::new(
                ErrorKind::InvalidEntity {
                    entity: after.trim_start_matches('&').to_string(),
                },
                Span::empty(),
            ));
        };
        let entity = after.get(1..end).unwrap_or_default();
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(entity),
        };

        match decoded {
            Some(ch) => result.push(ch),
            None => {
                return Err(Error::new(
                    ErrorKind::InvalidEntity {
                        entity: entity.to_string(),
                    },
                    Span::empty(),
                ));
            }
        }
        rest = after.get(end + 1..).unwrap_or_default();
    }
    result.push_str(rest);

    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    let decoded = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    };
    decoded.filter(|c| is_xml_char(*c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ensure_eq<T: PartialEq + std::fmt::Debug>(left: T, right: T) -> Result<()> {
        if left == right {
            Ok(())
        } else {
            Err(Error::with_message(
                ErrorKind::InvalidToken,
                Span::empty(),
                format!("assertion failed: left={left:?} right={right:?}"),
            ))
        }
    }

    fn parse(input: &str) -> Result<Document> {
        Parser::new(input.as_bytes()).parse()
    }

    fn first_element(element: &Element) -> Result<&Element> {
        element.elements().next().ok_or_else(|| {
            Error::with_message(ErrorKind::InvalidToken, Span::empty(), "expected child element")
        })
    }

    #[test]
    fn test_parse_simple_element() -> Result<()> {
        let doc = parse("<root></root>")?;
        ensure_eq(doc.root.name.as_str(), "root")?;
        ensure_eq(doc.root.children.len(), 0)?;
        Ok(())
    }

    #[test]
    fn test_parse_with_attributes() -> Result<()> {
        let doc = parse("<root id=\"1\" name='test'></root>")?;
        ensure_eq(doc.root.attributes.get("id"), Some(&"1".to_string()))?;
        ensure_eq(doc.root.attributes.get("name"), Some(&"test".to_string()))?;
        Ok(())
    }

    #[test]
    fn test_parse_nested_text() -> Result<()> {
        let doc = parse("<root><child>text</child></root>")?;
        let child = first_element(&doc.root)?;
        ensure_eq(child.name.as_str(), "child")?;
        ensure_eq(child.text(), "text".to_string())?;
        Ok(())
    }

    #[test]
    fn test_parse_self_closing() -> Result<()> {
        let doc = parse("<root><child /></root>")?;
        let child = first_element(&doc.root)?;
        ensure_eq(child.children.len(), 0)?;
        Ok(())
    }

    #[test]
    fn test_whitespace_text_is_kept() -> Result<()> {
        let doc = parse("<root>  \n\t </root>")?;
        ensure_eq(doc.root.text(), "  \n\t ".to_string())?;
        Ok(())
    }

    #[test]
    fn test_prolog_and_epilog_are_skipped() -> Result<()> {
        let input = "<?xml version=\"1.0\" encoding=\"UTF-8\"?> \n<!DOCTYPE root [<!ENTITY x \"y\">]>\
                     <!-- leading --><root/><!-- trailing --><?pi data?>\n";
        let doc = parse(input)?;
        ensure_eq(doc.root.name.as_str(), "root")?;
        Ok(())
    }

    #[test]
    fn test_cdata_merges_with_text() -> Result<()> {
        let doc = parse("<root>a<![CDATA[<b> & c]]>d<!-- skip -->e</root>")?;
        ensure_eq(doc.root.text(), "a<b> & cde".to_string())?;
        ensure_eq(doc.root.children.len(), 1)?;
        Ok(())
    }

    #[test]
    fn test_entities_are_decoded() -> Result<()> {
        let doc = parse("<root a=\"&quot;x&quot;\">&lt;&amp;&#65;&#x42;&gt;</root>")?;
        ensure_eq(doc.root.text(), "<&AB>".to_string())?;
        ensure_eq(doc.root.attributes.get("a"), Some(&"\"x\"".to_string()))?;
        Ok(())
    }

    #[test]
    fn test_namespaces_are_resolved() -> Result<()> {
        let doc = parse(
            "<xml xmlns=\"urn:default\" xmlns:ns=\"data:namespace\"><ns:message/><plain/></xml>",
        )?;
        ensure_eq(doc.root.attributes.len(), 0)?;
        ensure_eq(
            doc.root.namespaces.get("ns"),
            Some(&"data:namespace".to_string()),
        )?;
        ensure_eq(doc.root.namespace.as_deref(), Some("urn:default"))?;

        let mut children = doc.root.elements();
        let prefixed = children.next().map(|e| e.namespace.clone());
        let plain = children.next().map(|e| e.namespace.clone());
        ensure_eq(prefixed, Some(Some("data:namespace".to_string())))?;
        ensure_eq(plain, Some(Some("urn:default".to_string())))?;
        Ok(())
    }

    #[test]
    fn test_undeclared_prefix_is_tolerated() -> Result<()> {
        let doc = parse("<a><p:b/></a>")?;
        let child = first_element(&doc.root)?;
        ensure_eq(child.name.as_str(), "p:b")?;
        ensure_eq(child.namespace.clone(), None)?;
        Ok(())
    }

    #[test]
    fn test_malformed_documents_are_rejected() -> Result<()> {
        let cases = [
            "as|df>ASFBw924hg2=",
            "<a><b></a>",
            "<a>",
            "<a></a><b></b>",
            "<a x=\"1\" x=\"2\"/>",
            "<a x=\"<\"/>",
            "<a>&unknown;</a>",
            "<a x=1/>",
            "<a x=\"1\"y=\"2\"/>",
            "<a><![CDATA[open</a>",
            "</a>",
            "<a>]]></a>",
            "<a>x ]]> y</a>",
            "<a>&#0;</a>",
            "<a>&#x1;</a>",
            "<a>&#xFFFE;</a>",
            "<a>\u{1}</a>",
            "<a b=\"\u{1b}\"/>",
            "<a><![CDATA[\u{0}]]></a>",
            "<a b:=\"1\"/>",
            "<a :b=\"1\"/>",
            "<a:></a:>",
            "<!DOCTYPE a><!DOCTYPE b><a/>",
            "<a/><!DOCTYPE a>",
        ];
        for input in cases {
            if parse(input).is_ok() {
                return Err(Error::with_message(
                    ErrorKind::InvalidToken,
                    Span::empty(),
                    format!("expected failure for {input:?}"),
                ));
            }
        }
        Ok(())
    }

    #[test]
    fn test_mismatched_tag_kind() -> Result<()> {
        match parse("<a></b>") {
            Err(err) => ensure_eq(
                err.kind().clone(),
                ErrorKind::MismatchedTag {
                    expected: "a".to_string(),
                    found: "b".to_string(),
                },
            ),
            Ok(_) => Err(Error::with_message(
                ErrorKind::InvalidToken,
                Span::empty(),
                "expected mismatched tag error",
            )),
        }
    }

    #[test]
    fn test_line_endings_are_normalized() -> Result<()> {
        let doc = parse("<root a=\"1\r\n2\">x\r\ny\rz<![CDATA[\r\n]]></root>")?;
        ensure_eq(doc.root.text(), "x\ny\nz\n".to_string())?;
        ensure_eq(doc.root.attributes.get("a"), Some(&"1 2".to_string()))?;

        let referenced = parse("<root>a&#13;&#xD;b</root>")?;
        ensure_eq(referenced.root.text(), "a\r\rb".to_string())?;
        Ok(())
    }

    #[test]
    fn test_valid_chars_and_names_are_accepted() -> Result<()> {
        let doc = parse("<!DOCTYPE p:a><p:a xmlns:p=\"urn:p\" p:b=\"\u{e9}\">\t&#x10000;]]</p:a>")?;
        ensure_eq(doc.root.name.as_str(), "p:a")?;
        ensure_eq(doc.root.text(), "\t\u{10000}]]".to_string())?;
        ensure_eq(doc.root.attributes.get("p:b"), Some(&"\u{e9}".to_string()))?;
        Ok(())
    }

    #[test]
    fn test_max_depth() -> Result<()> {
        let nested = |depth: usize| "<a>".repeat(depth) + &"</a>".repeat(depth);
        ensure_eq(parse(&nested(DEFAULT_MAX_DEPTH)).is_ok(), true)?;
        ensure_eq(parse(&nested(DEFAULT_MAX_DEPTH + 1)).is_ok(), false)?;

        let config = Config { max_depth: 2 };
        let ok = Parser::with_config(b"<a><b/></a>", config).parse();
        ensure_eq(ok.is_ok(), true)?;

        let deep = Parser::with_config(b"<a><b><c/></b></a>", config).parse();
        ensure_eq(
            deep.err().map(|e| e.kind().clone()),
            Some(ErrorKind::MaxDepthExceeded { max: 2 }),
        )?;
        Ok(())
    }
}
