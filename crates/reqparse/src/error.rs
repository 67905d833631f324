//! Error types for reqparse

use std::fmt;
use thiserror::Error;

use crate::format::Format;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.offset, self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn empty() -> Self {
        Self {
            start: Pos::new(0, 0, 0),
            end: Pos::new(0, 0, 0),
        }
    }

    pub const fn at(pos: Pos) -> Self {
        Self::new(pos, pos)
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The payload could not be parsed in its format. This is the only kind
    /// surfaced by the public parsing entry points.
    MalformedDocument { format: Format },
    InvalidToken,
    UnexpectedEof,
    MismatchedTag { expected: String, found: String },
    DuplicateAttribute { name: String },
    InvalidEntity { entity: String },
    InvalidUtf8,
    TrailingContent,
    MaxDepthExceeded { max: usize },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedDocument { format } => {
                write!(f, "Failed To Parse {}", format.display_name())
            }
            Self::InvalidToken => write!(f, "invalid token"),
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::MismatchedTag { expected, found } => {
                write!(f, "mismatched closing tag: expected </{expected}>, found </{found}>")
            }
            Self::DuplicateAttribute { name } => write!(f, "duplicate attribute: {name}"),
            Self::InvalidEntity { entity } => write!(f, "invalid entity: &{entity};"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
            Self::TrailingContent => write!(f, "content after root element"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
        }
    }
}

/// Main error type for reqparse
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
    detail: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
            detail: None,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
            detail: None,
        }
    }

    /// Wrap a lower-level failure into the public "Failed To Parse ..." error.
    ///
    /// The cause is kept as [`Error::detail`] and its span is carried over.
    pub fn malformed(format: Format, cause: impl fmt::Display, span: Span) -> Self {
        let mut err = Self::new(ErrorKind::MalformedDocument { format }, span);
        err.detail = Some(cause.to_string());
        err
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Underlying reason for a malformed document, if known
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Create error at specific position
    pub fn at(kind: ErrorKind, pos: Pos) -> Self {
        Self::new(kind, Span::at(pos))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::MalformedDocument { .. } => f.write_str(&self.message),
            _ => write!(f, "error at {}: {}", self.span.start, self.message),
        }
    }
}

/// Result type alias for reqparse
pub type Result<T> = std::result::Result<T, Error>;
