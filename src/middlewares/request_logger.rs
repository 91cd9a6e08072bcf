use std::time::SystemTime;

use async_trait::async_trait;
use axum::http::header::CONTENT_LENGTH;

use crate::message::Message;
use crate::pipeline::{Error, Middleware};

/// Service name `request_logger` looks up for its options.
pub const REQUEST_LOGGER_OPTIONS: &str = "request_logger_options";

#[derive(Debug, Clone, Default)]
pub struct RequestLoggerOptions {
    /// Log nothing.
    pub silent: bool,
}

/// Logs one line per completed request.
#[derive(Debug, Clone, Default)]
pub struct RequestLogger {
    options: RequestLoggerOptions,
}

impl RequestLogger {
    pub fn new(options: RequestLoggerOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Middleware for RequestLogger {
    async fn postcatch(&self, message: Message) -> Result<Message, Error> {
        if self.options.silent {
            return Ok(message);
        }

        let request = &message.request;
        let response = &message.response;
        let status = response.status_or_ok();
        let elapsed_ms = SystemTime::now()
            .duration_since(request.timestamp)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let remote = request
            .remote_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "-".to_string());
        let length = response
            .headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        if status.is_server_error() {
            tracing::warn!(
                remote = %remote,
                method = %request.method,
                path = %request.path,
                version = ?request.version,
                status = status.as_u16(),
                length,
                elapsed_ms,
                "Request failed"
            );
        } else {
            tracing::info!(
                remote = %remote,
                method = %request.method,
                path = %request.path,
                version = ?request.version,
                status = status.as_u16(),
                length,
                elapsed_ms,
                "Request completed"
            );
        }
        Ok(message)
    }
}
