//! Route lookup.
//!
//! # Responsibilities
//! - Check every provider a route tree references before it goes live
//! - Resolve a method and path to the deepest matching node
//! - Accumulate path parameters along the way
//! - Build node scopes on first visit (or eagerly via `warm`)
//!
//! # Design Decisions
//! - Never returns "no match": misses land on a synthesized fallback
//! - Unknown provider names fail at build time, not per request
//! - One tree per router; reloading config builds a new router

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::config::{RouteConfig, RouterConfig};
use crate::message::{Message, Params};
use crate::routing::flatten::{self, FlatRoute};
use crate::routing::matcher::split_path;
use crate::routing::node::{
    RouteNode, DEFAULT_HANDLER, NOT_FOUND_HANDLER, REDIRECT_HANDLER, ROOT_CATCHER,
};
use crate::scope::{ProviderKind, Registry, ScopeError};

/// Errors raised while building a router.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("route `{route}` references unknown provider `{name}`")]
    UnknownProvider { route: String, name: String },

    #[error("route `{route}` uses `{name}` as a {expected:?}, but it is a {found:?}")]
    WrongKind {
        route: String,
        name: String,
        expected: ProviderKind,
        found: ProviderKind,
    },

    #[error("route `{route}` declares invalid method `{method}`")]
    InvalidMethod { route: String, method: String },

    #[error("route `{route}` redirects with non-redirect status {status}")]
    InvalidRedirect { route: String, status: u16 },
}

/// Result of resolving a method and path.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub route: Arc<RouteNode>,
    pub params: Params,
}

/// The route tree plus the registry its scopes draw from.
#[derive(Debug)]
pub struct Router {
    root: Arc<RouteNode>,
    registry: Arc<Registry>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Build from the `[router]` and `[[routes]]` sections of a config.
    pub fn from_config(
        router: &RouterConfig,
        routes: &[RouteConfig],
        registry: Registry,
    ) -> Result<Self, RouterError> {
        Self::builder()
            .registry(registry)
            .required_middlewares(router.required_middlewares.clone())
            .services(router.services.clone())
            .routes(routes.to_vec())
            .build()
    }

    /// The synthetic root wrapping the declared routes.
    pub fn root(&self) -> &Arc<RouteNode> {
        &self.root
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolve the message's request and record the outcome on it.
    pub fn route(&self, mut message: Message) -> Message {
        let resolved = self.resolve(&message.request.method, &message.request.path);
        message.request.params = resolved.params;
        message.request.route = Some(resolved.route);
        message
    }

    /// Walk the tree for `method` and `path`.
    pub fn resolve(&self, method: &Method, path: &str) -> Resolved {
        let segments = split_path(path);
        let mut remaining = segments.as_slice();
        let mut params = Params::new();
        let mut node = self.root.clone();

        loop {
            node.scope();
            if node.children().is_empty() || remaining.is_empty() {
                break;
            }

            let (child, matched) = node.match_child(method, remaining);
            params.extend(matched.params);
            remaining = &remaining[matched.consumed..];
            node = child;
        }

        tracing::trace!(
            method = %method,
            path = %path,
            route = %node.path(),
            handler = node.handler(),
            "Route resolved"
        );

        Resolved { route: node, params }
    }

    /// Build every declared node's scope and instantiate its handler,
    /// middlewares and catcher. Returns the number of nodes warmed.
    pub fn warm(&self) -> Result<usize, ScopeError> {
        let mut warmed = 0;
        let mut pending = vec![self.root.clone()];

        while let Some(node) = pending.pop() {
            let scope = node.scope();
            scope.handler(node.handler())?;
            for name in node.middlewares() {
                scope.middleware(name)?;
            }
            if let Some(catcher) = node.catcher() {
                scope.catcher(catcher)?;
            }
            warmed += 1;
            pending.extend(node.children().iter().cloned());
        }

        tracing::info!(nodes = warmed, "Route scopes warmed");
        Ok(warmed)
    }

    /// Documentation view of the tree, sorted by path.
    pub fn flatten(&self) -> Vec<FlatRoute> {
        flatten::flatten(&self.root)
    }
}

/// Assembles a [`Router`], checking every referenced provider.
#[derive(Debug, Default)]
pub struct RouterBuilder {
    routes: Vec<RouteConfig>,
    registry: Option<Registry>,
    required_middlewares: Vec<String>,
    services: Vec<String>,
}

impl RouterBuilder {
    pub fn routes(mut self, routes: Vec<RouteConfig>) -> Self {
        self.routes = routes;
        self
    }

    pub fn route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    /// Defaults to [`Registry::with_builtins`].
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Middlewares attached to the synthetic root, so they wrap every route.
    pub fn required_middlewares(mut self, names: Vec<String>) -> Self {
        self.required_middlewares = names;
        self
    }

    pub fn required_middleware(mut self, name: impl Into<String>) -> Self {
        self.required_middlewares.push(name.into());
        self
    }

    /// Services visible from every route.
    pub fn services(mut self, names: Vec<String>) -> Self {
        self.services = names;
        self
    }

    pub fn service(mut self, name: impl Into<String>) -> Self {
        self.services.push(name.into());
        self
    }

    pub fn build(self) -> Result<Router, RouterError> {
        let registry = self.registry.unwrap_or_else(Registry::with_builtins);

        let checker = Checker {
            registry: &registry,
        };
        let root = "<root>";
        checker.expect(root, NOT_FOUND_HANDLER, ProviderKind::Handler)?;
        checker.expect(root, ROOT_CATCHER, ProviderKind::Catcher)?;
        for name in &self.required_middlewares {
            checker.expect(root, name, ProviderKind::Middleware)?;
        }
        for name in &self.services {
            checker.expect(root, name, ProviderKind::Service)?;
        }
        for route in &self.routes {
            checker.route("", route)?;
        }

        let registry = Arc::new(registry);
        let root = RouteNode::root(
            &self.routes,
            self.required_middlewares,
            self.services,
            registry.clone(),
        );

        tracing::debug!(routes = self.routes.len(), "Router built");
        Ok(Router { root, registry })
    }
}

struct Checker<'a> {
    registry: &'a Registry,
}

impl Checker<'_> {
    fn expect(&self, route: &str, name: &str, expected: ProviderKind) -> Result<(), RouterError> {
        let provider = self
            .registry
            .get(name)
            .ok_or_else(|| RouterError::UnknownProvider {
                route: route.to_string(),
                name: name.to_string(),
            })?;
        if provider.kind() != expected {
            return Err(RouterError::WrongKind {
                route: route.to_string(),
                name: name.to_string(),
                expected,
                found: provider.kind(),
            });
        }
        Ok(())
    }

    fn route(&self, prefix: &str, route: &RouteConfig) -> Result<(), RouterError> {
        let label = join_label(prefix, &route.path);

        for method in route.methods.iter().flatten() {
            if Method::from_bytes(method.as_bytes()).is_err() {
                return Err(RouterError::InvalidMethod {
                    route: label,
                    method: method.clone(),
                });
            }
        }
        if let Some(status) = route.redirect_as {
            let valid = StatusCode::from_u16(status).is_ok_and(|s| s.is_redirection());
            if !valid {
                return Err(RouterError::InvalidRedirect {
                    route: label,
                    status,
                });
            }
        }

        for name in &route.services {
            self.expect(&label, name, ProviderKind::Service)?;
        }
        for name in &route.middlewares {
            self.expect(&label, name, ProviderKind::Middleware)?;
        }
        let handler = match (&route.handler, &route.redirect_to) {
            (Some(handler), _) => handler.as_str(),
            (None, Some(_)) => REDIRECT_HANDLER,
            (None, None) => DEFAULT_HANDLER,
        };
        self.expect(&label, handler, ProviderKind::Handler)?;
        if let Some(catcher) = &route.catcher {
            self.expect(&label, catcher, ProviderKind::Catcher)?;
        }

        for child in &route.children {
            self.route(&label, child)?;
        }
        Ok(())
    }
}

fn join_label(prefix: &str, path: &str) -> String {
    let mut segments = split_path(prefix);
    segments.extend(split_path(path));
    format!("/{}", segments.join("/"))
}
