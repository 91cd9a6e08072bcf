//! Per-request phase runner.
//!
//! # Responsibilities
//! - Route the message once
//! - Run prehandle, handle and posthandle, stopping at the first error
//! - Convert errors into responses (domain exception or nearest catcher)
//! - Always run postcatch, then record metrics
//!
//! # Design Decisions
//! - Middleware in a phase run one after another on copies of the phase
//!   input, then merge
//! - Panics in pluggable units are captured and treated as unexpected errors
//! - A failing postcatch is logged and answered with a minimal response;
//!   it is never caught a second time

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use futures_util::FutureExt;

use crate::catchers::CatchAll;
use crate::config::InfoConfig;
use crate::message::{Context, Message, Request, Response};
use crate::observability::metrics;
use crate::pipeline::{merge, Catcher, Error, Middleware, Phase};
use crate::routing::{RouteNode, Router};
use crate::scope::ScopeError;

/// Threads messages through the router and the pipeline phases.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    info: InfoConfig,
}

impl Dispatcher {
    pub fn new(router: Arc<Router>, info: InfoConfig) -> Self {
        Self { router, info }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn info(&self) -> &InfoConfig {
        &self.info
    }

    /// Fresh context bound to this dispatcher's router.
    pub fn context(&self) -> Context {
        Context::new(self.router.clone(), self.info.clone())
    }

    /// Wrap a request in a new message with a fresh context.
    pub fn message(&self, request: Request) -> Message {
        Message::new(Arc::new(self.context()), request)
    }

    /// Run the whole pipeline. Always yields a message with a response.
    pub async fn dispatch(&self, message: Message) -> Message {
        let started = Instant::now();

        let message = if message.request.route.is_some() {
            message
        } else {
            self.router.route(message)
        };
        let route = message
            .request
            .route
            .clone()
            .unwrap_or_else(|| self.router.root().clone());

        tracing::debug!(
            method = %message.request.method,
            path = %message.request.path,
            route = %route.path(),
            handler = route.handler(),
            "Dispatching request"
        );

        let original = message.clone();
        let message = match self.run(&route, message).await {
            Ok(message) => message,
            Err(error) => self.catch(&route, original, error).await,
        };
        let message = self.postcatch(&route, message).await;

        metrics::record_request(
            message.request.method.as_str(),
            message.response.status_or_ok().as_u16(),
            route.path(),
            started,
        );
        message
    }

    /// Like [`Dispatcher::dispatch`], but gives up as soon as `cancel`
    /// completes. The in-flight phase is dropped and nothing further runs.
    pub async fn dispatch_until<F>(&self, message: Message, cancel: F) -> Option<Message>
    where
        F: Future<Output = ()>,
    {
        let method = message.request.method.clone();
        let path = message.request.path.clone();
        tokio::select! {
            biased;
            _ = cancel => {
                tracing::debug!(method = %method, path = %path, "Dispatch cancelled");
                None
            }
            message = self.dispatch(message) => Some(message),
        }
    }

    async fn run(&self, route: &Arc<RouteNode>, message: Message) -> Result<Message, Error> {
        let message = self.phase(route, Phase::Prehandle, message).await?;
        let handler = route.scope().handler(route.handler())?;
        let message = guarded(handler.handle(message)).await?;
        self.phase(route, Phase::Posthandle, message).await
    }

    async fn phase(
        &self,
        route: &Arc<RouteNode>,
        phase: Phase,
        message: Message,
    ) -> Result<Message, Error> {
        let middlewares = middlewares(route, phase)?;
        if middlewares.is_empty() {
            return Ok(message);
        }

        let mut outputs = Vec::with_capacity(middlewares.len());
        for middleware in &middlewares {
            let output = guarded(phase.invoke(middleware.as_ref(), message.clone())).await?;
            outputs.push(output);
        }
        tracing::trace!(phase = %phase, middlewares = outputs.len(), "Phase merged");
        Ok(merge(message, outputs))
    }

    async fn catch(&self, route: &Arc<RouteNode>, original: Message, error: Error) -> Message {
        let response = match error {
            Error::Exception(response) => {
                if response.status_or_ok().is_server_error() {
                    tracing::warn!(
                        path = %original.request.path,
                        status = response.status_or_ok().as_u16(),
                        "Handler raised server error"
                    );
                }
                response
            }
            error => {
                let catcher = nearest_catcher(route);
                match AssertUnwindSafe(catcher.catch(&error)).catch_unwind().await {
                    Ok(response) => response,
                    Err(payload) => {
                        tracing::error!(
                            error = %error,
                            panic = %Error::from_panic(payload),
                            "Catcher panicked"
                        );
                        Response::new().with_status(StatusCode::INTERNAL_SERVER_ERROR)
                    }
                }
            }
        };
        original.with_response(response)
    }

    async fn postcatch(&self, route: &Arc<RouteNode>, message: Message) -> Message {
        match self.phase(route, Phase::Postcatch, message.clone()).await {
            Ok(message) => message,
            Err(Error::Exception(response)) => {
                tracing::error!(
                    path = %message.request.path,
                    status = response.status_or_ok().as_u16(),
                    "Postcatch raised an exception"
                );
                message.with_response(response)
            }
            Err(error) => {
                tracing::error!(
                    path = %message.request.path,
                    error = %error,
                    "Postcatch failed"
                );
                message.with_response(Response::new().with_status(StatusCode::INTERNAL_SERVER_ERROR))
            }
        }
    }
}

/// Middlewares of the route and its ancestors in the phase's order, each
/// instantiated through the scope of the node that declares it.
fn middlewares(route: &Arc<RouteNode>, phase: Phase) -> Result<Vec<Arc<dyn Middleware>>, ScopeError> {
    let mut chain: Vec<Arc<RouteNode>> = route.ancestry().collect();
    chain.reverse();

    let mut resolved = Vec::new();
    for node in &chain {
        if node.middlewares().is_empty() {
            continue;
        }
        let scope = node.scope();
        for name in node.middlewares() {
            resolved.push(scope.middleware(name)?);
        }
    }
    if phase.reversed() {
        resolved.reverse();
    }
    Ok(resolved)
}

/// First catcher declared on the route or an ancestor that resolves.
fn nearest_catcher(route: &Arc<RouteNode>) -> Arc<dyn Catcher> {
    for node in route.ancestry() {
        let Some(name) = node.catcher() else {
            continue;
        };
        match node.scope().catcher(name) {
            Ok(catcher) => return catcher,
            Err(error) => {
                tracing::warn!(route = %node.path(), catcher = name, error = %error, "Catcher unavailable");
            }
        }
    }
    Arc::new(CatchAll)
}

async fn guarded<F>(future: F) -> Result<Message, Error>
where
    F: Future<Output = Result<Message, Error>>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(Error::from_panic(payload)))
}
