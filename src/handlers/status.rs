use async_trait::async_trait;
use axum::http::StatusCode;

use crate::message::Message;
use crate::pipeline::{Error, Handler};

/// Answers 200 OK and leaves everything else alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOk;

#[async_trait]
impl Handler for StatusOk {
    async fn handle(&self, mut message: Message) -> Result<Message, Error> {
        message.response.status = Some(StatusCode::OK);
        Ok(message)
    }
}
