//! JSON payloads, decoded with `serde_json`

use tracing::debug;

use crate::error::{Error, Pos, Result, Span};
use crate::format::Format;
use crate::value::{Mapping, Value};

/// Parse a JSON payload. Empty input yields an empty mapping.
pub fn parse(input: &str) -> Result<Value> {
    if input.trim().is_empty() {
        return Ok(Value::Mapping(Mapping::new()));
    }

    serde_json::from_str::<serde_json::Value>(input)
        .map(Value::from)
        .map_err(|err| {
            debug!(error = %err, "rejected json payload");
            let pos = Pos::new(
                0,
                u32::try_from(err.line()).unwrap_or(u32::MAX),
                u32::try_from(err.column()).unwrap_or(u32::MAX),
            );
            Error::malformed(Format::Json, &err, Span::at(pos))
        })
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(entries) => Self::Mapping(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}
