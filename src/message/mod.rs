//! The unit of data threaded through the dispatch pipeline.
//!
//! # Data Flow
//! ```text
//! transport adapter builds Message { context, request, response: empty }
//!     → Router::route (sets request.route, request.params)
//!     → pipeline phases (mutate response, occasionally request)
//!     → transport adapter consumes response
//! ```
//!
//! # Design Decisions
//! - `context` is shared by `Arc` across every phase (and every fan-out copy)
//! - `request.route` is written once by the router and never again
//! - Header maps use `http::HeaderMap`, so lookups are case-insensitive

pub mod body;
pub mod request;
pub mod response;

use std::fmt;
use std::sync::Arc;

use axum::http::Extensions;

use crate::config::InfoConfig;
use crate::routing::Router;

pub use body::Body;
pub use request::{Params, Query, Request};
pub use response::Response;

/// Ambient, read-mostly data shared by every phase of one request.
pub struct Context {
    /// The router that resolved this request.
    pub router: Arc<Router>,
    /// Service title and version, as configured.
    pub info: InfoConfig,
    /// Host-transport internals (peer address, raw extensions).
    pub internal: Extensions,
}

impl Context {
    pub fn new(router: Arc<Router>, info: InfoConfig) -> Self {
        Self {
            router,
            info,
            internal: Extensions::new(),
        }
    }

    pub fn with_internal(mut self, internal: Extensions) -> Self {
        self.internal = internal;
        self
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Request, response and context for one inbound request.
#[derive(Debug, Clone)]
pub struct Message {
    pub context: Arc<Context>,
    pub request: Request,
    pub response: Response,
}

impl Message {
    pub fn new(context: Arc<Context>, request: Request) -> Self {
        Self {
            context,
            request,
            response: Response::new(),
        }
    }

    /// Replace the response while keeping the original context and request.
    pub fn with_response(mut self, response: Response) -> Self {
        self.response = response;
        self
    }
}
