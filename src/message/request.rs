//! Request view of a message.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Version};

use crate::message::Body;
use crate::routing::RouteNode;

/// Path parameters bound while routing, keyed by parameter name.
pub type Params = HashMap<String, String>;

/// Decoded query string, in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    /// Parse a raw `a=1&b=2` query string.
    pub fn parse(raw: &str) -> Self {
        Self(
            url::form_urlencoded::parse(raw.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The inbound side of a message.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    /// Header names are case-insensitive by construction.
    pub headers: HeaderMap,
    pub body: Body,
    pub params: Params,
    pub query: Query,
    /// Deepest matched route; set exactly once by the router.
    pub route: Option<Arc<RouteNode>>,
    pub timestamp: SystemTime,
    pub version: Version,
    pub remote_addr: Option<SocketAddr>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Body::Empty,
            params: Params::new(),
            query: Query::default(),
            route: None,
            timestamp: SystemTime::now(),
            version: Version::HTTP_11,
            remote_addr: None,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_query(mut self, raw: &str) -> Self {
        self.query = Query::parse(raw);
        self
    }

    /// Convenience accessor for a bound path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}
