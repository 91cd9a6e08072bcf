//! Pipeline ordering, merging, error conversion and cancellation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{Method, StatusCode};

use dispatch_core::config::{InfoConfig, RouteConfig, RouterConfig};
use dispatch_core::message::{Body, Request};
use dispatch_core::pipeline::Dispatcher;
use dispatch_core::routing::Router;

mod common;

use common::{entries, send, status, Log, X_MARK};

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn chain() -> Vec<RouteConfig> {
    vec![RouteConfig::new("/a").middleware("a").child(
        RouteConfig::new("/b")
            .middleware("b")
            .child(RouteConfig::new("/c").middleware("c")),
    )]
}

#[tokio::test]
async fn test_middleware_order_follows_ancestry() {
    let log = log();
    let (registry, _) = common::registry(&log);
    let dispatcher = common::dispatcher(chain(), registry);

    let message = send(&dispatcher, Method::GET, "/a/b/c").await;

    assert_eq!(
        entries(&log),
        vec![
            "pre:a", "pre:b", "pre:c", "post:c", "post:b", "post:a", "catch:c", "catch:b",
            "catch:a",
        ]
    );
    assert_eq!(message.response.headers[X_MARK], "a");
    assert_eq!(status(&message), StatusCode::OK);
}

#[tokio::test]
async fn test_domain_exception_bypasses_catcher() {
    let log = log();
    let (registry, _) = common::registry(&log);
    let dispatcher = common::dispatcher(
        vec![RouteConfig::new("/gone")
            .catcher("catch_all")
            .middleware("a")
            .handler("missing")],
        registry,
    );

    let message = send(&dispatcher, Method::GET, "/gone").await;

    assert_eq!(message.response.status, Some(StatusCode::NOT_FOUND));
    assert!(message.response.body.is_empty());
    // Posthandle never ran; postcatch always does.
    assert_eq!(entries(&log), vec!["pre:a", "catch:a"]);
    assert_eq!(message.request.path, "/gone");
}

#[tokio::test]
async fn test_unexpected_error_reaches_root_catch_all() {
    let log = log();
    let (registry, _) = common::registry(&log);
    let dispatcher = common::dispatcher(vec![RouteConfig::new("/broken").handler("broken")], registry);

    let message = send(&dispatcher, Method::GET, "/broken").await;

    assert_eq!(status(&message), StatusCode::INTERNAL_SERVER_ERROR);
    let Body::Json(json) = &message.response.body else {
        panic!("expected JSON body, got {:?}", message.response.body);
    };
    assert_eq!(json["error"], "database unreachable");
}

#[tokio::test]
async fn test_panic_is_caught() {
    let log = log();
    let (registry, _) = common::registry(&log);
    let dispatcher = common::dispatcher(
        vec![RouteConfig::new("/panic").middleware("a").handler("panicky")],
        registry,
    );

    let message = send(&dispatcher, Method::GET, "/panic").await;

    assert_eq!(status(&message), StatusCode::INTERNAL_SERVER_ERROR);
    let Body::Json(json) = &message.response.body else {
        panic!("expected JSON body");
    };
    assert_eq!(json["error"], "panicked: handler exploded");
    assert_eq!(entries(&log), vec!["pre:a", "catch:a"]);
}

#[tokio::test]
async fn test_postcatch_failure_yields_bare_500() {
    let log = log();
    let (registry, _) = common::registry(&log);
    let dispatcher = common::dispatcher(
        vec![RouteConfig::new("/ok").middleware("broken_postcatch")],
        registry,
    );

    let message = send(&dispatcher, Method::GET, "/ok").await;

    assert_eq!(message.response.status, Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert!(message.response.body.is_empty());
}

#[tokio::test]
async fn test_params_reach_handler() {
    let log = log();
    let (registry, _) = common::registry(&log);
    let dispatcher = common::dispatcher(
        vec![RouteConfig::new("/foo/bar").child(RouteConfig::new("/this/{id}/{user}").handler("echo"))],
        registry,
    );

    let message = send(&dispatcher, Method::GET, "/foo/bar/this/10/mark").await;
    assert_eq!(message.response.body.as_text(), Some("id=10\nuser=mark"));
}

#[tokio::test]
async fn test_not_found_and_options_on_misses() {
    let log = log();
    let (registry, _) = common::registry(&log);
    let dispatcher = common::dispatcher(chain(), registry);

    let missing = send(&dispatcher, Method::GET, "/a/zzz").await;
    assert_eq!(missing.response.status, Some(StatusCode::NOT_FOUND));
    // The fallback under /a still runs /a's middleware.
    assert!(entries(&log).contains(&"pre:a".to_string()));

    let probe = send(&dispatcher, Method::OPTIONS, "/a/zzz").await;
    assert_eq!(probe.response.status, Some(StatusCode::OK));
    assert!(probe.response.headers.contains_key(ALLOW));
}

#[tokio::test]
async fn test_normalizer_from_router_config() {
    let router = Router::from_config(
        &RouterConfig::default(),
        &[RouteConfig::new("/routes").handler("route_listing")],
        dispatch_core::scope::Registry::with_builtins(),
    )
    .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(router), InfoConfig::default());

    let message = dispatcher
        .dispatch(dispatcher.message(Request::new(Method::GET, "/routes")))
        .await;

    assert_eq!(message.response.status, Some(StatusCode::OK));
    assert_eq!(message.response.headers[CONTENT_TYPE], "application/json");
    assert!(message.response.headers.contains_key(CONTENT_LENGTH));
    assert!(matches!(message.response.body, Body::Bytes(_)));
}

#[tokio::test]
async fn test_cancelled_dispatch_runs_no_further_phases() {
    let log = log();
    let (registry, _) = common::registry(&log);
    let dispatcher = common::dispatcher(
        vec![RouteConfig::new("/slow").middleware("a").handler("stalled")],
        registry,
    );

    let outcome = dispatcher
        .dispatch_until(
            dispatcher.message(Request::new(Method::GET, "/slow")),
            tokio::time::sleep(Duration::from_millis(20)),
        )
        .await;

    assert!(outcome.is_none());
    assert_eq!(entries(&log), vec!["pre:a"]);
}

#[tokio::test]
async fn test_concurrent_requests_share_route_scope() {
    let log = log();
    let (registry, built) = common::registry(&log);
    let dispatcher = Arc::new(common::dispatcher(
        vec![RouteConfig::new("/count").service("counter").handler("counted")],
        registry,
    ));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { send(&dispatcher, Method::GET, "/count").await })
        })
        .collect();

    for task in tasks {
        let message = task.await.unwrap();
        assert_eq!(message.response.body.as_text(), Some("0"));
    }
    assert_eq!(built.load(std::sync::atomic::Ordering::SeqCst), 1);
}
