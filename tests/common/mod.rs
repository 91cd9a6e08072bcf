//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};

use dispatch_core::config::{InfoConfig, RouteConfig};
use dispatch_core::message::{Message, Request};
use dispatch_core::pipeline::{Dispatcher, Error, Handler, Middleware};
use dispatch_core::routing::Router;
use dispatch_core::scope::{Provider, Registry};

pub const X_MARK: HeaderName = HeaderName::from_static("x-mark");

/// Ordered record of middleware hook invocations.
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Logs every hook and stamps `x-mark` with its name in posthandle.
pub struct Recorder {
    pub name: String,
    pub log: Log,
}

impl Recorder {
    fn record(&self, phase: &str) {
        self.log.lock().unwrap().push(format!("{}:{}", phase, self.name));
    }
}

#[async_trait]
impl Middleware for Recorder {
    async fn prehandle(&self, message: Message) -> Result<Message, Error> {
        self.record("pre");
        Ok(message)
    }

    async fn posthandle(&self, mut message: Message) -> Result<Message, Error> {
        self.record("post");
        message
            .response
            .headers
            .insert(X_MARK, HeaderValue::from_str(&self.name).unwrap());
        Ok(message)
    }

    async fn postcatch(&self, message: Message) -> Result<Message, Error> {
        self.record("catch");
        Ok(message)
    }
}

/// Counts how many instances were built.
pub struct Counter {
    pub id: usize,
}

/// Handler that carries the `counter` service it was built with.
pub struct Counted {
    pub counter: Arc<Counter>,
}

#[async_trait]
impl Handler for Counted {
    async fn handle(&self, mut message: Message) -> Result<Message, Error> {
        message.response.status = Some(StatusCode::OK);
        message.response.body = self.counter.id.to_string().into();
        Ok(message)
    }
}

/// Raises a domain exception carrying a bare 404.
pub struct Missing;

#[async_trait]
impl Handler for Missing {
    async fn handle(&self, _message: Message) -> Result<Message, Error> {
        Err(Error::status(StatusCode::NOT_FOUND))
    }
}

pub struct Panicky;

#[async_trait]
impl Handler for Panicky {
    async fn handle(&self, _message: Message) -> Result<Message, Error> {
        panic!("handler exploded");
    }
}

pub struct Broken;

#[async_trait]
impl Handler for Broken {
    async fn handle(&self, _message: Message) -> Result<Message, Error> {
        Err(Error::other("database unreachable"))
    }
}

/// Echoes the bound path parameters back as `name=value` lines.
pub struct Echo;

#[async_trait]
impl Handler for Echo {
    async fn handle(&self, mut message: Message) -> Result<Message, Error> {
        let mut params: Vec<_> = message
            .request
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        params.sort();
        message.response.body = params.join("\n").into();
        Ok(message)
    }
}

/// Fails in postcatch only.
pub struct BrokenPostcatch;

#[async_trait]
impl Middleware for BrokenPostcatch {
    async fn postcatch(&self, _message: Message) -> Result<Message, Error> {
        Err(Error::other("postcatch broke"))
    }
}

/// Never finishes handling.
pub struct Stalled;

#[async_trait]
impl Handler for Stalled {
    async fn handle(&self, _message: Message) -> Result<Message, Error> {
        std::future::pending::<()>().await;
        unreachable!()
    }
}

/// Built-ins plus the fixtures above. Recorders `a`, `b` and `c` share `log`;
/// the returned counter tracks how many `counter` services were built.
pub fn registry(log: &Log) -> (Registry, Arc<AtomicUsize>) {
    let built = Arc::new(AtomicUsize::new(0));
    let mut registry = Registry::with_builtins();

    for name in ["a", "b", "c"] {
        let log = log.clone();
        registry.insert(Provider::middleware(name, move |_| {
            Ok(Recorder {
                name: name.to_string(),
                log: log.clone(),
            })
        }));
    }

    let counter_built = built.clone();
    registry
        .insert(Provider::service("counter", move |_| {
            Ok(Counter {
                id: counter_built.fetch_add(1, Ordering::SeqCst),
            })
        }))
        .insert(Provider::handler("counted", |r| {
            Ok(Counted {
                counter: r.get::<Counter>("counter")?,
            })
        }))
        .insert(Provider::handler("missing", |_| Ok(Missing)))
        .insert(Provider::handler("panicky", |_| Ok(Panicky)))
        .insert(Provider::handler("broken", |_| Ok(Broken)))
        .insert(Provider::handler("echo", |_| Ok(Echo)))
        .insert(Provider::handler("stalled", |_| Ok(Stalled)))
        .insert(Provider::middleware("broken_postcatch", |_| Ok(BrokenPostcatch)));

    (registry, built)
}

pub fn router(routes: Vec<RouteConfig>, registry: Registry) -> Router {
    Router::builder()
        .registry(registry)
        .routes(routes)
        .build()
        .unwrap()
}

pub fn dispatcher(routes: Vec<RouteConfig>, registry: Registry) -> Dispatcher {
    Dispatcher::new(Arc::new(router(routes, registry)), InfoConfig::default())
}

pub async fn send(dispatcher: &Dispatcher, method: Method, path: &str) -> Message {
    dispatcher
        .dispatch(dispatcher.message(Request::new(method, path)))
        .await
}

pub fn status(message: &Message) -> StatusCode {
    message.response.status_or_ok()
}
