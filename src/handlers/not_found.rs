use async_trait::async_trait;
use axum::http::header::ALLOW;
use axum::http::{HeaderValue, Method, StatusCode};

use crate::message::Message;
use crate::pipeline::{Error, Handler};
use crate::routing::ALL_METHODS;

/// Handler of synthesized fallback routes.
///
/// `OPTIONS` probes get 200 with an `Allow` header listing every verb, so
/// CORS preflights succeed on any path. Anything else keeps a status set
/// earlier in the pipeline, or gets 404.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFound;

#[async_trait]
impl Handler for NotFound {
    async fn handle(&self, mut message: Message) -> Result<Message, Error> {
        if message.request.method == Method::OPTIONS {
            let allow = ALL_METHODS
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(",");
            message
                .response
                .headers
                .insert(ALLOW, HeaderValue::from_str(&allow).map_err(Error::other)?);
            message.response.status = Some(StatusCode::OK);
        } else if message.response.status.is_none() {
            message.response.status = Some(StatusCode::NOT_FOUND);
        }
        Ok(message)
    }
}
