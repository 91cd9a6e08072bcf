//! Capability traits for pluggable units.

use std::fmt;

use async_trait::async_trait;

use crate::message::{Message, Response};
use crate::pipeline::Error;

/// Terminal unit of a route: turns the routed message into a response.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, message: Message) -> Result<Message, Error>;
}

/// Cross-cutting unit with one hook per phase.
///
/// Every hook defaults to passing the message through untouched, so an
/// implementation only overrides the phases it cares about.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn prehandle(&self, message: Message) -> Result<Message, Error> {
        Ok(message)
    }

    async fn posthandle(&self, message: Message) -> Result<Message, Error> {
        Ok(message)
    }

    /// Runs whether or not an error was caught.
    async fn postcatch(&self, message: Message) -> Result<Message, Error> {
        Ok(message)
    }
}

/// Turns an unexpected error into a response.
#[async_trait]
pub trait Catcher: Send + Sync {
    async fn catch(&self, error: &Error) -> Response;
}

/// Middleware phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Prehandle,
    Posthandle,
    Postcatch,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Prehandle => "prehandle",
            Phase::Posthandle => "posthandle",
            Phase::Postcatch => "postcatch",
        }
    }

    /// Prehandle runs root to leaf; the later phases unwind leaf to root.
    pub fn reversed(&self) -> bool {
        !matches!(self, Phase::Prehandle)
    }

    pub(crate) async fn invoke(
        &self,
        middleware: &dyn Middleware,
        message: Message,
    ) -> Result<Message, Error> {
        match self {
            Phase::Prehandle => middleware.prehandle(message).await,
            Phase::Posthandle => middleware.posthandle(message).await,
            Phase::Postcatch => middleware.postcatch(message).await,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
