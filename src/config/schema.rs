//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server,
//! including the declarative route tree. All types derive Serde traits for
//! deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the dispatch server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Service title and version, exposed to handlers through the context.
    pub info: InfoConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Router-wide settings.
    pub router: RouterConfig,

    /// Declarative route tree.
    pub routes: Vec<RouteConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:4200").
    pub bind_address: String,

    /// Largest request body buffered into a message.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4200".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Service description shared with every request.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct InfoConfig {
    pub title: String,
    pub version: String,
}

impl Default for InfoConfig {
    fn default() -> Self {
        Self {
            title: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub log_filter: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Address of the Prometheus scrape endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "dispatch_core=info,tower_http=info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Router-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Middlewares attached to the synthetic root, in declaration order.
    pub required_middlewares: Vec<String>,

    /// Services declared on the synthetic root, visible to every route.
    pub services: Vec<String>,

    /// Build every declared route's scope at startup instead of lazily.
    pub eager_scopes: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            required_middlewares: vec!["normalizer".to_string()],
            services: Vec::new(),
            eager_scopes: false,
        }
    }
}

/// How a route's own segments relate to the remaining request path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathMatch {
    /// Consumed segments must exhaust the remaining path.
    Full,
    /// Remaining segments continue into children.
    #[default]
    Prefix,
}

/// Schema names describing a route's request, for documentation.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RequestMetadata {
    pub header: Option<String>,
    pub path: Option<String>,
    pub query: Option<String>,
    /// Content type → schema name.
    pub body: BTreeMap<String, String>,
}

impl RequestMetadata {
    pub fn is_empty(&self) -> bool {
        self.header.is_none() && self.path.is_none() && self.query.is_none() && self.body.is_empty()
    }
}

/// Status code → content type → schema name.
pub type ResponseMetadata = BTreeMap<String, BTreeMap<String, String>>;

/// One node of the declarative route tree.
///
/// Handlers, middlewares, catchers and services are referenced by the name
/// they were registered under in the provider registry.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RouteConfig {
    /// Path pattern: empty (pass-through), literal/parameter segments, or `**`.
    pub path: String,

    /// Applicable verbs; absent means all.
    pub methods: Option<Vec<String>>,

    pub path_match: PathMatch,

    pub handler: Option<String>,

    pub middlewares: Vec<String>,

    pub catcher: Option<String>,

    pub services: Vec<String>,

    pub redirect_to: Option<String>,

    /// Redirect status; 301 when absent.
    pub redirect_as: Option<u16>,

    pub description: Option<String>,

    pub summary: Option<String>,

    pub request: Option<RequestMetadata>,

    pub responses: Option<ResponseMetadata>,

    /// Children, first match wins.
    pub children: Vec<RouteConfig>,
}

impl RouteConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn methods(mut self, methods: &[&str]) -> Self {
        self.methods = Some(methods.iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn full(mut self) -> Self {
        self.path_match = PathMatch::Full;
        self
    }

    pub fn handler(mut self, name: impl Into<String>) -> Self {
        self.handler = Some(name.into());
        self
    }

    pub fn middleware(mut self, name: impl Into<String>) -> Self {
        self.middlewares.push(name.into());
        self
    }

    pub fn catcher(mut self, name: impl Into<String>) -> Self {
        self.catcher = Some(name.into());
        self
    }

    pub fn service(mut self, name: impl Into<String>) -> Self {
        self.services.push(name.into());
        self
    }

    pub fn redirect(mut self, target: impl Into<String>, status: Option<u16>) -> Self {
        self.redirect_to = Some(target.into());
        self.redirect_as = status;
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn summary(mut self, text: impl Into<String>) -> Self {
        self.summary = Some(text.into());
        self
    }

    pub fn child(mut self, child: RouteConfig) -> Self {
        self.children.push(child);
        self
    }
}
