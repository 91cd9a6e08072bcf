use async_trait::async_trait;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};

use crate::message::{Body, Message};
use crate::pipeline::{Error, Middleware};

const APPLICATION_JSON: &str = "application/json";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

/// Final shaping of every response.
///
/// Defaults the status to 200, infers `Content-Type` when none is set,
/// serializes JSON bodies and sets `Content-Length` for non-empty bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

#[async_trait]
impl Middleware for Normalizer {
    async fn postcatch(&self, mut message: Message) -> Result<Message, Error> {
        let response = &mut message.response;
        response.status.get_or_insert(StatusCode::OK);

        if response.body.is_empty() {
            return Ok(message);
        }

        if !response.headers.contains_key(CONTENT_TYPE) {
            let mime = match &response.body {
                Body::Json(_) => APPLICATION_JSON.to_string(),
                Body::Text(_) => TEXT_PLAIN.to_string(),
                _ => mime_guess::from_path(&message.request.path)
                    .first_raw()
                    .unwrap_or(OCTET_STREAM)
                    .to_string(),
            };
            response
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_str(&mime).map_err(Error::other)?);
        }

        let body = std::mem::take(&mut response.body).into_bytes()?;
        response
            .headers
            .insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        response.body = Body::Bytes(body);
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::Method;

    use crate::config::InfoConfig;
    use crate::message::{Context, Request, Response};
    use crate::routing::Router;

    use super::*;

    fn message(path: &str, response: Response) -> Message {
        let router = Arc::new(Router::builder().build().unwrap());
        let context = Arc::new(Context::new(router, InfoConfig::default()));
        Message::new(context, Request::new(Method::GET, path)).with_response(response)
    }

    #[tokio::test]
    async fn test_empty_response_gets_status_only() {
        let out = Normalizer
            .postcatch(message("/", Response::new()))
            .await
            .unwrap();
        assert_eq!(out.response.status, Some(StatusCode::OK));
        assert!(out.response.headers.is_empty());
        assert!(out.response.body.is_empty());
    }

    #[tokio::test]
    async fn test_json_is_serialized() {
        let response = Response::new().with_body(serde_json::json!({"a": 1}));
        let out = Normalizer.postcatch(message("/", response)).await.unwrap();
        assert_eq!(out.response.headers[CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(out.response.headers[CONTENT_LENGTH], "7");
        assert_eq!(out.response.body.as_text(), Some(r#"{"a":1}"#));
    }

    #[tokio::test]
    async fn test_bytes_typed_from_path() {
        let response = Response::new().with_body(b"body{}".to_vec());
        let out = Normalizer
            .postcatch(message("/static/site.css", response))
            .await
            .unwrap();
        assert_eq!(out.response.headers[CONTENT_TYPE], "text/css");

        let response = Response::new().with_body(b"\x00\x01".to_vec());
        let out = Normalizer
            .postcatch(message("/blob", response))
            .await
            .unwrap();
        assert_eq!(out.response.headers[CONTENT_TYPE], OCTET_STREAM);
    }

    #[tokio::test]
    async fn test_explicit_values_are_kept() {
        let response = Response::new()
            .with_status(StatusCode::CREATED)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/html"))
            .with_body("<p>hi</p>");
        let out = Normalizer.postcatch(message("/", response)).await.unwrap();
        assert_eq!(out.response.status, Some(StatusCode::CREATED));
        assert_eq!(out.response.headers[CONTENT_TYPE], "text/html");
    }
}
