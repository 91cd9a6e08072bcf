//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check route declarations (verbs, redirect statuses, patterns)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Provider names are checked later, against the registry, when the router is built

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::Method;
use thiserror::Error;

use crate::config::schema::{RouteConfig, ServerConfig};
use crate::routing::matcher::{param_name, split_path, WILDCARD};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} `{value}` is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("route `{route}` declares unknown method `{method}`")]
    InvalidMethod { route: String, method: String },

    #[error("route `{route}` redirects with non-3xx status {status}")]
    InvalidRedirectStatus { route: String, status: u16 },

    #[error("wildcard route `{route}` cannot have children")]
    WildcardWithChildren { route: String },

    #[error("route `{route}` has a parameter segment without a name")]
    EmptyParameter { route: String },

    #[error("route `{route}` binds parameter `{name}` twice")]
    DuplicateParameter { route: String, name: String },
}

/// Validate a whole configuration, collecting every problem.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    for route in &config.routes {
        validate_route(route, "", &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_route(route: &RouteConfig, prefix: &str, errors: &mut Vec<ValidationError>) {
    let full_path = join(prefix, &route.path);

    for method in route.methods.iter().flatten() {
        if Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidMethod {
                route: full_path.clone(),
                method: method.clone(),
            });
        }
    }

    if let Some(status) = route.redirect_as {
        if !(300..=399).contains(&status) {
            errors.push(ValidationError::InvalidRedirectStatus {
                route: full_path.clone(),
                status,
            });
        }
    }

    if route.path.trim_matches('/') == WILDCARD && !route.children.is_empty() {
        errors.push(ValidationError::WildcardWithChildren {
            route: full_path.clone(),
        });
    }

    let mut seen = HashSet::new();
    for segment in split_path(&route.path) {
        match param_name(segment) {
            Some("") => errors.push(ValidationError::EmptyParameter {
                route: full_path.clone(),
            }),
            Some(name) if !seen.insert(name) => errors.push(ValidationError::DuplicateParameter {
                route: full_path.clone(),
                name: name.to_string(),
            }),
            _ => {}
        }
    }

    for child in &route.children {
        validate_route(child, &full_path, errors);
    }
}

fn join(prefix: &str, path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        prefix.to_string()
    } else {
        format!("{}/{}", prefix, trimmed)
    }
}
