//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, tower layers: request id, trace, timeout, body limit)
//!     → adapter.rs (axum request → Message)
//!     → Dispatcher::dispatch (route + pipeline)
//!     → adapter.rs (Message.response → axum response)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - One catch-all axum route; all routing happens in the dispatch core
//! - The live dispatcher sits behind `ArcSwap`, so reloads never block requests
//! - Client disconnects drop the dispatch future, cancelling remaining phases

pub mod adapter;
pub mod request;
pub mod server;

pub use request::{request_id, UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
