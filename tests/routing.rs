//! Route tree matching, fallback memoisation, flatten and scope sharing.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use axum::http::Method;

use dispatch_core::config::RouteConfig;
use dispatch_core::routing::Router;
use dispatch_core::scope::Registry;

mod common;

fn plain(routes: Vec<RouteConfig>) -> Router {
    Router::builder()
        .registry(Registry::with_builtins())
        .routes(routes)
        .build()
        .unwrap()
}

#[test]
fn test_first_declared_sibling_wins() {
    let router = plain(vec![
        RouteConfig::new("/items/:id").handler("route_listing"),
        RouteConfig::new("/items/special"),
    ]);
    let resolved = router.resolve(&Method::GET, "/items/special");
    assert_eq!(resolved.route.path(), "/items/:id");
    assert_eq!(resolved.params.get("id").map(String::as_str), Some("special"));
}

#[test]
fn test_parameters_extracted_under_prefix() {
    let router = plain(vec![RouteConfig::new("/foo/bar")
        .child(RouteConfig::new("/this/{id}/{user}"))]);
    let resolved = router.resolve(&Method::GET, "/foo/bar/this/10/mark");
    assert_eq!(resolved.route.path(), "/this/{id}/{user}");
    assert_eq!(resolved.params.len(), 2);
    assert_eq!(resolved.params["id"], "10");
    assert_eq!(resolved.params["user"], "mark");
}

#[test]
fn test_deeper_binding_overrides_ancestor() {
    let router = plain(vec![RouteConfig::new("/:id").child(RouteConfig::new("/:id"))]);
    let resolved = router.resolve(&Method::GET, "/outer/inner");
    assert_eq!(resolved.params["id"], "inner");
}

#[test]
fn test_full_match_rejects_longer_path() {
    let full = plain(vec![RouteConfig::new("/fizz/baz").full()]);
    let resolved = full.resolve(&Method::GET, "/fizz/baz/extra");
    assert!(resolved.route.is_fallback());

    let resolved = full.resolve(&Method::GET, "/fizz/baz");
    assert_eq!(resolved.route.path(), "/fizz/baz");
}

#[test]
fn test_prefix_match_passes_rest_to_children() {
    let router = plain(vec![
        RouteConfig::new("/fizz/baz").child(RouteConfig::new("/extra").handler("route_listing"))
    ]);
    let resolved = router.resolve(&Method::GET, "/fizz/baz/extra");
    assert_eq!(resolved.route.path(), "/extra");
    assert_eq!(resolved.route.parent().unwrap().path(), "/fizz/baz");
}

#[test]
fn test_fallback_is_memoised_per_parent() {
    let router = plain(vec![RouteConfig::new("/api").child(RouteConfig::new("/users"))]);

    let first = router.resolve(&Method::GET, "/api/nope").route;
    let second = router.resolve(&Method::POST, "/api/other/thing").route;
    assert!(first.is_fallback());
    assert!(Arc::ptr_eq(&first, &second));

    let api = first.parent().unwrap();
    assert_eq!(api.path(), "/api");
    assert!(Arc::ptr_eq(api.fallback().unwrap(), &first));

    let top = router.resolve(&Method::GET, "/elsewhere").route;
    assert!(top.is_fallback());
    assert!(!Arc::ptr_eq(&top, &first));
}

#[test]
fn test_fallback_spawns_under_concurrent_misses_once() {
    let router = Arc::new(plain(vec![RouteConfig::new("/known")]));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let router = router.clone();
            std::thread::spawn(move || router.resolve(&Method::GET, &format!("/miss/{}", i)).route)
        })
        .collect();
    let routes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(routes.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
fn test_redirect_is_not_inherited_when_flattened() {
    let router = plain(vec![RouteConfig::new("/old")
        .redirect("/new", Some(302))
        .handler("route_listing")
        .child(RouteConfig::new("/child"))]);
    let routes = router.flatten();

    let old = routes.iter().find(|r| r.path == "/old").unwrap();
    assert_eq!(old.redirect_to.as_deref(), Some("/new"));
    assert_eq!(old.redirect_as, Some(302));

    let child = routes.iter().find(|r| r.path == "/old/child").unwrap();
    assert_eq!(child.redirect_to, None);
    assert_eq!(child.redirect_as, None);
    assert_eq!(child.handler, "status_200");
}

#[test]
fn test_same_path_siblings_fold_into_one_entry() {
    let router = plain(vec![
        RouteConfig::new("/users/{id}").methods(&["PUT"]).summary("Replace"),
        RouteConfig::new("/users/{id}").methods(&["GET"]),
        RouteConfig::new("/users/{id}").methods(&["DELETE"]),
        RouteConfig::new("/about"),
    ]);
    let routes = router.flatten();

    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].path, "/about");
    let users = &routes[1];
    assert_eq!(users.path, "/users/{id}");
    assert_eq!(users.methods, vec!["DELETE", "GET", "PUT"]);
    assert_eq!(users.summary.as_deref(), Some("Replace"));
}

#[test]
fn test_flatten_serializes_listing_shape() {
    let router = plain(vec![RouteConfig::new("/ping").methods(&["GET"]).description("Ping")]);
    let json = serde_json::to_value(router.flatten()).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "path": "/ping",
            "methods": ["GET"],
            "description": "Ping",
            "handler": "status_200",
        }])
    );
}

#[test]
fn test_same_route_shares_handler_instance() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (registry, built) = common::registry(&log);
    let router = common::router(
        vec![
            RouteConfig::new("/one").service("counter").handler("counted"),
            RouteConfig::new("/two").service("counter").handler("counted"),
        ],
        registry,
    );

    let first = router.resolve(&Method::GET, "/one").route;
    let second = router.resolve(&Method::GET, "/one").route;
    assert!(Arc::ptr_eq(&first, &second));

    let a = first.scope().handler("counted").unwrap();
    let b = second.scope().handler("counted").unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let sibling = router.resolve(&Method::GET, "/two").route;
    let c = sibling.scope().handler("counted").unwrap();
    assert!(!Arc::ptr_eq(&a, &c));

    let one = first.scope().get::<common::Counter>("counter").unwrap();
    let two = sibling.scope().get::<common::Counter>("counter").unwrap();
    assert_ne!(one.id, two.id);
    assert_eq!(built.load(Ordering::SeqCst), 2);
}

#[test]
fn test_service_declared_on_ancestor_is_shared_by_children() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (registry, built) = common::registry(&log);
    let router = common::router(
        vec![RouteConfig::new("/api")
            .service("counter")
            .child(RouteConfig::new("/x").handler("counted"))
            .child(RouteConfig::new("/y").handler("counted"))],
        registry,
    );

    let x = router.resolve(&Method::GET, "/api/x").route.scope();
    let y = router.resolve(&Method::GET, "/api/y").route.scope();
    let from_x = x.get::<common::Counter>("counter").unwrap();
    let from_y = y.get::<common::Counter>("counter").unwrap();
    assert!(Arc::ptr_eq(&from_x, &from_y));
    assert_eq!(built.load(Ordering::SeqCst), 1);
}
