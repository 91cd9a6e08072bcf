use async_trait::async_trait;
use axum::http::StatusCode;

use crate::message::{Body, Message};
use crate::pipeline::{Error, Handler};

/// Answers with the flattened route tree of the router that resolved the
/// request, as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteListing;

#[async_trait]
impl Handler for RouteListing {
    async fn handle(&self, mut message: Message) -> Result<Message, Error> {
        let routes = message.context.router.flatten();
        message.response.body = Body::Json(serde_json::json!({
            "title": message.context.info.title,
            "version": message.context.info.version,
            "routes": routes,
        }));
        message.response.status = Some(StatusCode::OK);
        Ok(message)
    }
}
