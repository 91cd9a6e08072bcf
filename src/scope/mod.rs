//! Dependency scopes for routes.
//!
//! # Data Flow
//! ```text
//! Registry (arena of named providers, built at startup)
//!     → RouteNode lists provider names (services, middlewares, handler, catcher)
//!     → first visit: Scope { providers for those names, parent: parent node's scope }
//!     → handler/middleware/catcher lookups resolve through the scope chain
//! ```
//!
//! # Design Decisions
//! - Providers are explicit factories, looked up by name; no reflection
//! - Nearest declaration wins, then the parent chain is searched
//! - Instances are memoised per scope, so they are route-scoped singletons
//! - Resolution never holds a lock while a factory runs

pub mod container;
pub mod provider;

use thiserror::Error;

pub use container::{Resolver, Scope};
pub use provider::{Factory, Instance, Provider, ProviderKind, Registry};

/// Errors raised while resolving a provider.
#[derive(Debug, Clone, Error)]
pub enum ScopeError {
    #[error("no provider named `{name}` is reachable from scope `{scope}`")]
    UnknownProvider { name: String, scope: String },

    #[error("dependency cycle: {}", .chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    #[error("provider `{name}` does not produce a `{expected}`")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("provider `{name}` failed: {message}")]
    Factory { name: String, message: String },
}

impl ScopeError {
    /// Wrap a failure raised inside a provider factory.
    pub fn factory(name: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Factory {
            name: name.into(),
            message: error.to_string(),
        }
    }
}
