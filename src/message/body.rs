//! Request and response payloads.

use bytes::Bytes;

/// A message body.
///
/// Handlers may answer with structured JSON and leave serialization to the
/// normalizer or the transport adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Bytes(Bytes),
    Json(serde_json::Value),
}

impl Body {
    /// True when there is nothing to send.
    ///
    /// A JSON `null` counts as empty so that merging never lets it overwrite a
    /// real payload.
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Text(text) => text.is_empty(),
            Body::Bytes(bytes) => bytes.is_empty(),
            Body::Json(value) => value.is_null(),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Body::Json(_))
    }

    /// Serialize into wire bytes.
    pub fn into_bytes(self) -> Result<Bytes, serde_json::Error> {
        match self {
            Body::Empty => Ok(Bytes::new()),
            Body::Text(text) => Ok(Bytes::from(text)),
            Body::Bytes(bytes) => Ok(bytes),
            Body::Json(value) => serde_json::to_vec(&value).map(Bytes::from),
        }
    }

    /// Borrow the body as UTF-8 text when it is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            Body::Bytes(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(bytes))
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}
