//! Format dispatch: pick a parser for a payload and run it

use tracing::debug;

use crate::error::{Error, Result, Span};
use crate::format::{detect_format_or_default, Format};
use crate::input::Payload;
use crate::normalize::{self, Normalizer};
use crate::value::Value;
use crate::{json, query};

/// Parses payloads of any supported format into a [`Value`]
#[derive(Clone, Copy, Debug, Default)]
pub struct PayloadParser {
    normalizer: Normalizer,
}

impl PayloadParser {
    /// `config` applies to XML payloads
    pub const fn new(config: normalize::Config) -> Self {
        Self {
            normalizer: Normalizer::new(config),
        }
    }

    /// Format selected for `payload`: its content type, else JSON
    pub fn format_of(&self, payload: &Payload<'_>) -> Format {
        detect_format_or_default(payload.content_type())
    }

    pub fn parse(&self, payload: &Payload<'_>) -> Result<Value> {
        let format = self.format_of(payload);
        debug!(
            %format,
            content_type = payload.content_type().unwrap_or_default(),
            bytes = payload.len(),
            "parsing payload"
        );
        self.parse_as(format, payload.as_bytes())
    }

    /// Parse `body` as `format`, ignoring any content type
    pub fn parse_as(&self, format: Format, body: &[u8]) -> Result<Value> {
        let text = std::str::from_utf8(body)
            .map_err(|err| Error::malformed(format, err, Span::empty()))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        match format {
            Format::Xml => self.normalizer.normalize(text),
            Format::Json => json::parse(text),
            Format::QueryStr => query::parse(text),
        }
    }
}
