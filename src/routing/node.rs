//! The route tree.
//!
//! # Responsibilities
//! - Hold one declared route: pattern, verbs, provider names, redirect and docs
//! - Link children (owned) and parent (weak) for ancestor walks
//! - Build and cache the node's dependency scope on first use
//! - Synthesize and cache the fallback node for misses among its children
//!
//! # Design Decisions
//! - Immutable after construction apart from two compute-once cells
//! - The fallback is one node per parent, whatever the unmatched suffix
//! - Every node exposes a runnable handler name, explicit or defaulted

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use axum::http::{Method, StatusCode};

use crate::config::{PathMatch, RequestMetadata, ResponseMetadata, RouteConfig};
use crate::observability::metrics;
use crate::routing::matcher::{Matched, Pattern, WILDCARD};
use crate::scope::{Registry, Scope};

/// Handler used by routes that declare none.
pub const DEFAULT_HANDLER: &str = "status_200";
/// Handler used by routes that declare a redirect but no handler.
pub const REDIRECT_HANDLER: &str = "redirect_to";
/// Handler of synthesized fallback nodes.
pub const NOT_FOUND_HANDLER: &str = "not_found";
/// Catcher attached to the synthetic root.
pub const ROOT_CATCHER: &str = "catch_all";

/// One node of the route tree.
pub struct RouteNode {
    path: String,
    pattern: Pattern,
    methods: Option<Vec<Method>>,
    path_match: PathMatch,
    handler: Option<String>,
    middlewares: Vec<String>,
    catcher: Option<String>,
    services: Vec<String>,
    redirect_to: Option<String>,
    redirect_as: Option<StatusCode>,
    description: Option<String>,
    summary: Option<String>,
    request: Option<RequestMetadata>,
    responses: Option<ResponseMetadata>,
    children: Vec<Arc<RouteNode>>,
    parent: Weak<RouteNode>,
    phantom: bool,
    registry: Arc<Registry>,
    scope: OnceLock<Arc<Scope>>,
    fallback: OnceLock<Arc<RouteNode>>,
}

impl RouteNode {
    /// The synthetic root wrapping the declared routes.
    pub(crate) fn root(
        routes: &[RouteConfig],
        middlewares: Vec<String>,
        services: Vec<String>,
        registry: Arc<Registry>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| RouteNode {
            path: String::new(),
            pattern: Pattern::PassThrough,
            methods: None,
            path_match: PathMatch::Prefix,
            handler: None,
            middlewares,
            catcher: Some(ROOT_CATCHER.to_string()),
            services,
            redirect_to: None,
            redirect_as: None,
            description: None,
            summary: None,
            request: None,
            responses: None,
            children: routes
                .iter()
                .map(|child| RouteNode::from_config(child, me.clone(), &registry))
                .collect(),
            parent: Weak::new(),
            phantom: true,
            registry: registry.clone(),
            scope: OnceLock::new(),
            fallback: OnceLock::new(),
        })
    }

    /// Build a declared node and its subtree. The config must already have
    /// passed the router builder's checks.
    fn from_config(
        config: &RouteConfig,
        parent: Weak<RouteNode>,
        registry: &Arc<Registry>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| RouteNode {
            path: config.path.clone(),
            pattern: Pattern::compile(&config.path),
            // Verbs and statuses were validated by the builder.
            methods: config.methods.as_ref().map(|methods| {
                methods
                    .iter()
                    .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
                    .collect()
            }),
            path_match: config.path_match,
            handler: config.handler.clone(),
            middlewares: config.middlewares.clone(),
            catcher: config.catcher.clone(),
            services: config.services.clone(),
            redirect_to: config.redirect_to.clone(),
            redirect_as: config.redirect_as.and_then(|s| StatusCode::from_u16(s).ok()),
            description: config.description.clone(),
            summary: config.summary.clone(),
            request: config.request.clone(),
            responses: config.responses.clone(),
            children: config
                .children
                .iter()
                .map(|child| RouteNode::from_config(child, me.clone(), registry))
                .collect(),
            parent,
            phantom: false,
            registry: registry.clone(),
            scope: OnceLock::new(),
            fallback: OnceLock::new(),
        })
    }

    fn synthesize_fallback(parent: &Arc<RouteNode>) -> Arc<Self> {
        Arc::new(RouteNode {
            path: WILDCARD.to_string(),
            pattern: Pattern::Wildcard,
            methods: None,
            path_match: PathMatch::Prefix,
            handler: Some(NOT_FOUND_HANDLER.to_string()),
            middlewares: Vec::new(),
            catcher: None,
            services: Vec::new(),
            redirect_to: None,
            redirect_as: None,
            description: None,
            summary: None,
            request: None,
            responses: None,
            children: Vec::new(),
            parent: Arc::downgrade(parent),
            phantom: true,
            registry: parent.registry.clone(),
            scope: OnceLock::new(),
            fallback: OnceLock::new(),
        })
    }

    /// Raw path pattern as declared.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn methods(&self) -> Option<&[Method]> {
        self.methods.as_deref()
    }

    pub fn path_match(&self) -> PathMatch {
        self.path_match
    }

    /// Handler declared on this node, if any.
    pub fn declared_handler(&self) -> Option<&str> {
        self.handler.as_deref()
    }

    /// Handler that will run for this node: declared, redirect, or 200 OK.
    pub fn handler(&self) -> &str {
        match (&self.handler, &self.redirect_to) {
            (Some(handler), _) => handler,
            (None, Some(_)) => REDIRECT_HANDLER,
            (None, None) => DEFAULT_HANDLER,
        }
    }

    pub fn middlewares(&self) -> &[String] {
        &self.middlewares
    }

    pub fn catcher(&self) -> Option<&str> {
        self.catcher.as_deref()
    }

    pub fn services(&self) -> &[String] {
        &self.services
    }

    pub fn redirect_to(&self) -> Option<&str> {
        self.redirect_to.as_deref()
    }

    pub fn redirect_as(&self) -> Option<StatusCode> {
        self.redirect_as
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn request_metadata(&self) -> Option<&RequestMetadata> {
        self.request.as_ref()
    }

    pub fn response_metadata(&self) -> Option<&ResponseMetadata> {
        self.responses.as_ref()
    }

    pub fn children(&self) -> &[Arc<RouteNode>] {
        &self.children
    }

    pub fn parent(&self) -> Option<Arc<RouteNode>> {
        self.parent.upgrade()
    }

    /// True for the synthetic root and synthesized fallbacks.
    pub fn is_phantom(&self) -> bool {
        self.phantom
    }

    /// True for nodes fabricated at match time.
    pub fn is_fallback(&self) -> bool {
        self.phantom && self.pattern.is_wildcard()
    }

    /// The fallback synthesized under this node, if a miss has happened yet.
    pub fn fallback(&self) -> Option<&Arc<RouteNode>> {
        self.fallback.get()
    }

    /// This node followed by its ancestors up to the root.
    pub fn ancestry(self: &Arc<Self>) -> impl Iterator<Item = Arc<RouteNode>> {
        std::iter::successors(Some(self.clone()), |node| node.parent())
    }

    /// Whether this node accepts the request verb.
    pub fn accepts(&self, method: &Method) -> bool {
        self.methods
            .as_ref()
            .map_or(true, |methods| methods.contains(method))
    }

    /// Names this node contributes to its scope.
    fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.services
            .iter()
            .chain(self.middlewares.iter())
            .map(String::as_str)
            .chain(std::iter::once(self.handler()))
            .chain(self.catcher.as_deref())
    }

    /// The node's dependency scope, built on first use and chained to the
    /// parent's scope.
    pub fn scope(&self) -> Arc<Scope> {
        self.scope
            .get_or_init(|| {
                let parent = self.parent().map(|p| p.scope());
                let providers = self
                    .provider_names()
                    .filter_map(|name| self.registry.get(name).cloned())
                    .collect::<Vec<_>>();
                let label = if self.path.is_empty() { "<root>" } else { &self.path };
                tracing::trace!(route = %label, providers = providers.len(), "Scope built");
                Arc::new(Scope::new(label, providers, parent))
            })
            .clone()
    }

    pub fn has_scope(&self) -> bool {
        self.scope.get().is_some()
    }

    /// First child accepting the verb whose pattern matches the front of
    /// `remaining`; the memoised fallback when none does.
    pub(crate) fn match_child(
        self: &Arc<Self>,
        method: &Method,
        remaining: &[&str],
    ) -> (Arc<RouteNode>, Matched) {
        for child in &self.children {
            if !child.accepts(method) {
                continue;
            }
            if let Some(matched) = child.pattern.matches(remaining, child.path_match) {
                return (child.clone(), matched);
            }
        }

        let fallback = self.fallback.get_or_init(|| {
            tracing::debug!(parent = %self.path, "Synthesizing fallback route");
            metrics::record_fallback();
            RouteNode::synthesize_fallback(self)
        });
        let matched = Matched {
            consumed: remaining.len(),
            ..Matched::default()
        };
        (fallback.clone(), matched)
    }
}

impl fmt::Debug for RouteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteNode")
            .field("path", &self.path)
            .field("methods", &self.methods)
            .field("path_match", &self.path_match)
            .field("handler", &self.handler())
            .field("phantom", &self.phantom)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}
