use std::sync::Arc;

use http::Method;

use super::{DispatchUnit, MethodFilter, MethodKey, PathMatcher, RegexPathMatcher, Registry, Route};
use crate::dispatcher::HandlerResponse;
use crate::handler::Stage;

fn unit(key: MethodKey, pattern: &str, body: &'static str) -> DispatchUnit {
    let filter = match &key {
        MethodKey::Any => MethodFilter::Any,
        MethodKey::Method(m) => MethodFilter::Only(vec![m.clone()]),
    };
    let route = Route::new(
        pattern,
        filter,
        [Stage::call(move |_| Ok(HandlerResponse::from(body)))],
    )
    .unwrap();
    let compiled = RegexPathMatcher.compile(pattern).unwrap();
    DispatchUnit::new(key, route, None, Arc::from(Vec::new()), None, compiled)
}

fn get(pattern: &str, body: &'static str) -> DispatchUnit {
    unit(MethodKey::Method(Method::GET), pattern, body)
}

fn resolved_pattern(registry: &Registry, method: Method, path: &str) -> Option<String> {
    registry
        .resolve(&method, path)
        .map(|m| m.unit.pattern().to_string())
}

#[test]
fn test_method_bucket_before_any_bucket() {
    let mut registry = Registry::new();
    registry.insert(unit(MethodKey::Any, "/x", "any"));
    registry.insert(get("/x", "get"));

    let m = registry.resolve(&Method::GET, "/x").unwrap();
    assert_eq!(m.unit.key(), &MethodKey::Method(Method::GET));

    let m = registry.resolve(&Method::POST, "/x").unwrap();
    assert_eq!(m.unit.key(), &MethodKey::Any);
}

#[test]
fn test_first_registered_pattern_wins() {
    let mut registry = Registry::new();
    registry.insert(get("/users/{id}", "id"));
    registry.insert(get("/users/{name}", "name"));

    let m = registry.resolve(&Method::GET, "/users/42").unwrap();
    assert_eq!(m.unit.pattern(), "/users/{id}");
    assert_eq!(m.get_path_param("id"), Some("42"));
}

#[test]
fn test_earlier_placeholder_shadows_later_literal() {
    let mut registry = Registry::new();
    registry.insert(get("/users/{id}", "id"));
    registry.insert(get("/users/me", "me"));

    let m = registry.resolve(&Method::GET, "/users/me").unwrap();
    assert_eq!(m.unit.pattern(), "/users/{id}");
    assert_eq!(m.get_path_param("id"), Some("me"));
}

#[test]
fn test_literal_registered_first_wins() {
    let mut registry = Registry::new();
    registry.insert(get("/users/me", "me"));
    registry.insert(get("/users/{id}", "id"));

    assert_eq!(
        resolved_pattern(&registry, Method::GET, "/users/me").as_deref(),
        Some("/users/me")
    );
    assert_eq!(
        resolved_pattern(&registry, Method::GET, "/users/7").as_deref(),
        Some("/users/{id}")
    );
}

#[test]
fn test_no_match_in_either_bucket() {
    let mut registry = Registry::new();
    registry.insert(get("/a", "a"));
    assert!(registry.resolve(&Method::GET, "/b").is_none());
    assert!(registry.resolve(&Method::POST, "/a").is_none());
}

#[test]
fn test_insert_replaces_same_key_and_pattern() {
    let mut registry = Registry::new();
    registry.insert(get("/a", "one"));
    registry.insert(get("/b", "b"));
    let replaced = registry.insert(get("/a", "two"));

    assert!(replaced.is_some());
    assert_eq!(registry.len(), 2);
    let order: Vec<_> = registry.iter().map(|u| u.pattern().to_string()).collect();
    assert_eq!(order, ["/a", "/b"]);
}

#[test]
fn test_remove_by_route_id() {
    let mut registry = Registry::new();
    registry.insert(get("/a", "a"));
    registry.insert(get("/b", "b"));
    registry.insert(get("/c", "c"));
    let id = registry
        .get(&MethodKey::Method(Method::GET), "/b")
        .unwrap()
        .route()
        .id();

    let removed = registry.remove(id).unwrap();
    assert_eq!(removed.pattern(), "/b");
    assert!(registry.remove(id).is_none());
    let order: Vec<_> = registry.iter().map(|u| u.pattern().to_string()).collect();
    assert_eq!(order, ["/a", "/c"]);
}

#[test]
fn test_route_table_lines() {
    let mut registry = Registry::new();
    registry.insert(get("/a/{id}", "a"));
    registry.insert(unit(MethodKey::Any, "/any", "any"));

    let table = registry.route_table();
    assert_eq!(table.len(), 2);
    assert_eq!(table[0].method, "GET");
    assert_eq!(table[1].method, "ANY");
    assert_eq!(table[0].handler, "<callable>");

    let lines = registry.route_lines();
    assert!(lines[0].starts_with("GET"));
    assert!(lines[0].contains("/a/{id}"));
}

#[test]
fn test_retain_keeps_order_of_survivors() {
    let mut registry = Registry::new();
    registry.insert(get("/a", "a"));
    registry.insert(get("/b", "b"));
    registry.insert(unit(MethodKey::Any, "/c", "c"));
    registry.insert(get("/d", "d"));

    let dropped = registry.retain(|u| u.pattern() != "/b" && u.pattern() != "/c");
    assert_eq!(dropped, 2);
    let order: Vec<_> = registry.iter().map(|u| u.pattern().to_string()).collect();
    assert_eq!(order, ["/a", "/d"]);
}
