//! Payload format detection from `Content-Type` headers

use std::fmt;
use std::path::Path;

/// Supported payload formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Xml,
    QueryStr,
}

impl Format {
    /// Format used when a payload carries no recognizable content type
    pub const DEFAULT: Self = Self::Json;

    /// All formats, in the order they are advertised
    pub const ALL: [Self; 3] = [Self::Json, Self::Xml, Self::QueryStr];

    /// Name used in "Failed To Parse ..." messages
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Xml => "XML",
            Self::QueryStr => "Query String",
        }
    }

    /// Short lowercase identifier (`json`, `xml`, `query`)
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::QueryStr => "query",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const XML_TYPES: &[&str] = &["application/xml", "text/xml"];
const JSON_TYPES: &[&str] = &[
    "application/json",
    "text/json",
    "application/javascript",
    "text/javascript",
];
const QUERY_TYPES: &[&str] = &["application/x-www-form-urlencoded"];

/// Detect the payload format from a `Content-Type` header value.
///
/// Matching is case-insensitive and every `;`-separated part is considered,
/// so `charset=utf8; application/xml` is recognized as well as the usual
/// `application/xml; charset=utf8`.
pub fn detect_format(content_type: &str) -> Option<Format> {
    let lowered = content_type.to_ascii_lowercase();
    lowered
        .split(';')
        .map(str::trim)
        .find_map(media_type_format)
}

/// Like [`detect_format`], falling back to [`Format::DEFAULT`]
pub fn detect_format_or_default(content_type: Option<&str>) -> Format {
    content_type
        .and_then(detect_format)
        .unwrap_or(Format::DEFAULT)
}

/// Detect the payload format from a file extension
pub fn detect_format_from_path(path: impl AsRef<Path>) -> Option<Format> {
    let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "json" => Some(Format::Json),
        "xml" => Some(Format::Xml),
        "qs" | "query" => Some(Format::QueryStr),
        _ => None,
    }
}

fn media_type_format(part: &str) -> Option<Format> {
    if XML_TYPES.contains(&part) || part.ends_with("+xml") {
        Some(Format::Xml)
    } else if JSON_TYPES.contains(&part) || part.ends_with("+json") {
        Some(Format::Json)
    } else if QUERY_TYPES.contains(&part) {
        Some(Format::QueryStr)
    } else {
        None
    }
}
