//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum Router with a single catch-all handler
//! - Wire up tower layers (request id, tracing, timeout, body limit)
//! - Bind server to listener with graceful shutdown
//! - Hand every request to the live dispatcher
//! - Swap in a rebuilt dispatcher when the config changes

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use http_body_util::LengthLimitError;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::adapter;
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::lifecycle::{build_dispatcher, Shutdown, StartupError};
use crate::pipeline::Dispatcher;
use crate::scope::Registry;

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<ArcSwap<Dispatcher>>,
    pub max_body_bytes: usize,
}

/// HTTP front end for the dispatch core.
pub struct HttpServer {
    app: Router,
    config: ServerConfig,
    registry: Registry,
    dispatcher: Arc<ArcSwap<Dispatcher>>,
}

impl HttpServer {
    /// Build the router described by `config` and the axum app around it.
    pub fn new(config: ServerConfig, registry: Registry) -> Result<Self, StartupError> {
        let dispatcher = build_dispatcher(&config, registry.clone())?;
        let dispatcher = Arc::new(ArcSwap::from_pointee(dispatcher));

        let state = AppState {
            dispatcher: dispatcher.clone(),
            max_body_bytes: config.listener.max_body_bytes,
        };
        let app = Self::build_router(&config, state);

        Ok(Self {
            app,
            config,
            registry,
            dispatcher,
        })
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    )))
                    .map_response(IntoResponse::into_response)
                    .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes)),
            )
    }

    /// The axum app, for driving the server without a socket.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// The dispatcher currently serving requests.
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.load_full()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Rebuild the dispatcher from `config` and swap it in. On error the
    /// current dispatcher keeps serving.
    ///
    /// Only `[info]`, `[router]` and `[[routes]]` take effect; listener and
    /// timeout settings need a restart.
    pub fn reload(&self, config: &ServerConfig) -> Result<(), StartupError> {
        reload(&self.dispatcher, &self.registry, config)
    }

    /// Run the server until `shutdown` fires, applying config updates as
    /// they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        updates: Option<mpsc::UnboundedReceiver<ServerConfig>>,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if let Some(mut updates) = updates {
            let dispatcher = self.dispatcher.clone();
            let registry = self.registry.clone();
            let stop = shutdown.wait();
            tokio::spawn(async move {
                tokio::pin!(stop);
                loop {
                    tokio::select! {
                        _ = &mut stop => break,
                        update = updates.recv() => match update {
                            Some(config) => {
                                if let Err(e) = reload(&dispatcher, &registry, &config) {
                                    tracing::error!(error = %e, "Reload rejected, keeping current routes");
                                }
                            }
                            None => break,
                        },
                    }
                }
            });
        }

        let app = self.app.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn reload(
    current: &ArcSwap<Dispatcher>,
    registry: &Registry,
    config: &ServerConfig,
) -> Result<(), StartupError> {
    let dispatcher = build_dispatcher(config, registry.clone())?;
    current.store(Arc::new(dispatcher));
    tracing::info!(routes = config.routes.len(), "Routes reloaded");
    Ok(())
}

/// Catch-all handler: buffer, dispatch, render.
async fn dispatch_handler(State(state): State<AppState>, request: Request) -> Response {
    let dispatcher = state.dispatcher.load_full();
    let id = request_id(request.headers()).unwrap_or("-").to_string();

    let message = match adapter::into_message(&dispatcher, request, state.max_body_bytes).await {
        Ok(message) => message,
        Err(e) if exceeds_limit(&e) => {
            tracing::warn!(
                request_id = %id,
                max_body_bytes = state.max_body_bytes,
                "Request body too large"
            );
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
        Err(e) => {
            tracing::warn!(request_id = %id, error = %e, "Failed to read request body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    tracing::debug!(
        request_id = %id,
        method = %message.request.method,
        path = %message.request.path,
        "Dispatching"
    );

    let message = dispatcher.dispatch(message).await;
    adapter::into_response(message.response)
}

/// True when buffering stopped because the body outgrew its limit.
fn exceeds_limit(error: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
