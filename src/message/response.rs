//! Response view of a message.

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

use crate::message::Body;

/// The outbound side of a message.
///
/// Starts empty: no status, no headers, no body. Every phase may overwrite
/// it; the status stays `None` until somebody decides.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub body: Body,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Status to put on the wire; 200 unless a phase said otherwise.
    pub fn status_or_ok(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }
}
