use std::error::Error as _;

use async_trait::async_trait;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};

use crate::message::{Body, Response};
use crate::pipeline::{Catcher, Error};

/// Logs the error and answers 500 with a JSON description of it.
///
/// The body is `{"error": "...", "stack": ["cause", "cause of cause", ...]}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatchAll;

#[async_trait]
impl Catcher for CatchAll {
    async fn catch(&self, error: &Error) -> Response {
        let stack: Vec<String> = std::iter::successors(error.source(), |e| (*e).source())
            .map(|e| e.to_string())
            .collect();

        tracing::error!(error = %error, stack = ?stack, "Unhandled error");

        Response::new()
            .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(Body::Json(serde_json::json!({
                "error": error.to_string(),
                "stack": stack,
            })))
    }
}
