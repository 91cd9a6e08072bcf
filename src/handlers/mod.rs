//! Built-in handlers.
//!
//! # Handlers
//! - `status_200`: default for routes without a handler
//! - `redirect_to`: default for routes with `redirect_to`
//! - `not_found`: handler of synthesized fallback routes
//! - `route_listing`: JSON listing of the flattened route tree

pub mod listing;
pub mod not_found;
pub mod redirect;
pub mod status;

pub use listing::RouteListing;
pub use not_found::NotFound;
pub use redirect::RedirectTo;
pub use status::StatusOk;

use crate::scope::{Provider, Registry};

/// Register every built-in handler under its well-known name.
pub fn register(registry: &mut Registry) {
    registry
        .insert(Provider::handler("status_200", |_| Ok(StatusOk)))
        .insert(Provider::handler("redirect_to", |_| Ok(RedirectTo)))
        .insert(Provider::handler("not_found", |_| Ok(NotFound)))
        .insert(Provider::handler("route_listing", |_| Ok(RouteListing)));
}
