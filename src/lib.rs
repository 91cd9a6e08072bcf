//! Request dispatch core.
//!
//! Resolves requests against a declarative route tree, builds route-scoped
//! dependencies, and runs each request through middleware, a handler and
//! error catchers, with an axum transport on top.

pub mod catchers;
pub mod config;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod message;
pub mod middlewares;
pub mod observability;
pub mod pipeline;
pub mod routing;
pub mod scope;

pub use config::schema::{RouteConfig, ServerConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use message::{Body, Context, Message, Request, Response};
pub use pipeline::{Catcher, Dispatcher, Error, Handler, Middleware};
pub use routing::{Router, RouterError};
pub use scope::{Provider, Registry};
