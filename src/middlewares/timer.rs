use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};

use crate::message::Message;
use crate::pipeline::{Error, Middleware};

pub const X_REQUEST_TIMEIN: HeaderName = HeaderName::from_static("x-request-timein");
pub const X_REQUEST_TIMEOUT: HeaderName = HeaderName::from_static("x-request-timeout");
pub const X_RESPONSE_TIME: HeaderName = HeaderName::from_static("x-response-time");

/// Stamps the response with arrival and completion times (ms since the
/// epoch) and the elapsed milliseconds between them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timer;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[async_trait]
impl Middleware for Timer {
    async fn prehandle(&self, mut message: Message) -> Result<Message, Error> {
        message
            .response
            .headers
            .insert(X_REQUEST_TIMEIN, HeaderValue::from(now_millis()));
        Ok(message)
    }

    async fn posthandle(&self, mut message: Message) -> Result<Message, Error> {
        let headers = &mut message.response.headers;
        let timeout = now_millis();
        let timein = headers
            .get(&X_REQUEST_TIMEIN)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(timeout);

        headers.insert(X_REQUEST_TIMEOUT, HeaderValue::from(timeout));
        headers.insert(X_RESPONSE_TIME, HeaderValue::from(timeout.saturating_sub(timein)));
        Ok(message)
    }
}
