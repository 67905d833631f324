//! Raw request payloads

/// A request body together with its declared content type
#[derive(Clone, Copy, Debug)]
pub struct Payload<'a> {
    body: &'a [u8],
    content_type: Option<&'a str>,
}

impl<'a> Payload<'a> {
    /// Create from byte slice
    pub const fn from_bytes(body: &'a [u8]) -> Self {
        Self {
            body,
            content_type: None,
        }
    }

    /// Create from string
    pub const fn from_str(body: &'a str) -> Self {
        Self::from_bytes(body.as_bytes())
    }

    /// Set the `Content-Type` header value used for format detection
    pub const fn with_content_type(mut self, content_type: &'a str) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub const fn as_bytes(&self) -> &'a [u8] {
        self.body
    }

    pub const fn content_type(&self) -> Option<&'a str> {
        self.content_type
    }

    pub const fn len(&self) -> usize {
        self.body.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

impl<'a> From<&'a str> for Payload<'a> {
    fn from(s: &'a str) -> Self {
        Self::from_str(s)
    }
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(b: &'a [u8]) -> Self {
        Self::from_bytes(b)
    }
}
