//! Flattened, documentation-oriented view of the route tree.

use std::sync::Arc;

use axum::http::Method;
use serde::Serialize;

use crate::config::{RequestMetadata, ResponseMetadata};
use crate::routing::matcher::split_path;
use crate::routing::node::RouteNode;

/// Verbs listed, in this order, for routes that do not restrict methods.
pub const ALL_METHODS: [Method; 9] = [
    Method::CONNECT,
    Method::DELETE,
    Method::GET,
    Method::HEAD,
    Method::OPTIONS,
    Method::PATCH,
    Method::POST,
    Method::PUT,
    Method::TRACE,
];

/// One operation as documented by [`Router::flatten`](crate::routing::Router::flatten).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRoute {
    pub path: String,
    pub methods: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responses: Option<ResponseMetadata>,
    pub handler: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_as: Option<u16>,
}

pub(crate) fn flatten(root: &Arc<RouteNode>) -> Vec<FlatRoute> {
    let mut collected = Vec::new();
    collect(root, &mut collected);

    let mut folded: Vec<FlatRoute> = Vec::with_capacity(collected.len());
    for route in collected {
        match folded.iter_mut().find(|existing| existing.path == route.path) {
            Some(existing) => fold(existing, route),
            None => folded.push(route),
        }
    }

    folded.sort_by(|a, b| a.path.cmp(&b.path));
    folded
}

fn collect(node: &Arc<RouteNode>, out: &mut Vec<FlatRoute>) {
    let structural = node.is_phantom() || node.pattern().is_pass_through();
    if !structural && (node.declared_handler().is_some() || node.children().is_empty()) {
        out.push(harmonize(node));
    }
    for child in node.children() {
        collect(child, out);
    }
}

/// Fill in what a node inherits from its ancestors.
fn harmonize(node: &Arc<RouteNode>) -> FlatRoute {
    let chain: Vec<Arc<RouteNode>> = node.ancestry().collect();

    let mut segments: Vec<&str> = chain.iter().rev().flat_map(|n| split_path(n.path())).collect();
    segments.retain(|s| !s.is_empty());
    let path = format!("/{}", segments.join("/"));

    let methods = chain
        .iter()
        .find_map(|n| n.methods())
        .map(|methods| canonical(methods.iter()))
        .unwrap_or_else(|| canonical(ALL_METHODS.iter()));

    let description = chain
        .iter()
        .find_map(|n| n.description().filter(|d| !d.is_empty()))
        .map(str::to_string);
    let summary = chain
        .iter()
        .find_map(|n| n.summary().filter(|s| !s.is_empty()))
        .map(str::to_string);
    let request = chain
        .iter()
        .find_map(|n| n.request_metadata().filter(|r| !r.is_empty()))
        .cloned();
    let responses = chain
        .iter()
        .find_map(|n| n.response_metadata().filter(|r| !r.is_empty()))
        .cloned();

    FlatRoute {
        path,
        methods,
        summary,
        description,
        request,
        responses,
        handler: node.handler().to_string(),
        redirect_to: node.redirect_to().map(str::to_string),
        redirect_as: node.redirect_as().map(|s| s.as_u16()),
    }
}

fn fold(into: &mut FlatRoute, other: FlatRoute) {
    let methods: Vec<Method> = into
        .methods
        .iter()
        .chain(other.methods.iter())
        .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
        .collect();
    into.methods = canonical(methods.iter());

    into.summary = into.summary.take().or(other.summary);
    into.description = into.description.take().or(other.description);
    into.request = into.request.take().or(other.request);
    into.responses = into.responses.take().or(other.responses);
    into.redirect_to = into.redirect_to.take().or(other.redirect_to);
    into.redirect_as = into.redirect_as.take().or(other.redirect_as);
}

/// Deduplicated verb names, standard verbs first in canonical order.
fn canonical<'a>(methods: impl Iterator<Item = &'a Method>) -> Vec<String> {
    let methods: Vec<&Method> = methods.collect();
    let mut names: Vec<String> = ALL_METHODS
        .iter()
        .filter(|m| methods.contains(m))
        .map(|m| m.as_str().to_string())
        .collect();
    for method in methods {
        let name = method.as_str().to_string();
        if !ALL_METHODS.contains(method) && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
