//! Translation between axum requests/responses and pipeline messages.

use std::net::SocketAddr;

use axum::body::Body as AxumBody;
use axum::extract::ConnectInfo;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response as AxumResponse};

use crate::message::{Body, Message, Query, Request, Response};
use crate::pipeline::Dispatcher;

/// Buffer an axum request into a fresh message. The request's extensions
/// become the context's transport internals.
pub async fn into_message(
    dispatcher: &Dispatcher,
    request: axum::extract::Request,
    max_body_bytes: usize,
) -> Result<Message, axum::Error> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, max_body_bytes).await?;

    let mut inbound = Request::new(parts.method, parts.uri.path());
    inbound.headers = parts.headers;
    inbound.version = parts.version;
    inbound.query = parts.uri.query().map(Query::parse).unwrap_or_default();
    inbound.remote_addr = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    if !bytes.is_empty() {
        inbound.body = Body::Bytes(bytes);
    }

    let context = dispatcher.context().with_internal(parts.extensions);
    Ok(Message::new(context.into(), inbound))
}

/// Render a pipeline response for the wire.
pub fn into_response(response: Response) -> AxumResponse {
    let Response {
        status,
        mut headers,
        body,
    } = response;

    if body.is_json() && !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    let bytes = match body.into_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut out = AxumResponse::new(AxumBody::from(bytes));
    *out.status_mut() = status.unwrap_or(StatusCode::OK);
    *out.headers_mut() = headers;
    out
}
