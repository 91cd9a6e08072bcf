//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Build the router from the route tree and provider registry
//! - Optionally warm every scope so no construction happens per request
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Config reloads go through the same function

use std::sync::Arc;

use thiserror::Error;

use crate::config::{validate_config, ServerConfig, ValidationError};
use crate::pipeline::Dispatcher;
use crate::routing::{Router, RouterError};
use crate::scope::{Registry, ScopeError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error("failed to warm route scopes: {0}")]
    Warm(#[from] ScopeError),
}

/// Build a dispatcher for `config` on top of `registry`.
pub fn build_dispatcher(config: &ServerConfig, registry: Registry) -> Result<Dispatcher, StartupError> {
    validate_config(config).map_err(StartupError::Validation)?;

    let router = Router::from_config(&config.router, &config.routes, registry)?;
    if config.router.eager_scopes {
        router.warm()?;
    }

    tracing::info!(
        routes = config.routes.len(),
        eager_scopes = config.router.eager_scopes,
        title = %config.info.title,
        "Router ready"
    );
    Ok(Dispatcher::new(Arc::new(router), config.info.clone()))
}
