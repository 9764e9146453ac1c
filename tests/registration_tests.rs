mod common;

use common::{get, request, Trace};
use http::Method;
use stackroute::dispatcher::HandlerResponse;
use stackroute::error::{MountError, RegistrationError};
use stackroute::handler::{MainHandler, Stage};
use stackroute::router::MethodKey;
use stackroute::{Application, Collection};

#[test]
fn test_zero_handlers_rejected_and_collection_unchanged() {
    let mut coll = Collection::new();
    coll.get("/kept", [Stage::call(|_| Ok(HandlerResponse::from("kept")))])
        .unwrap();

    let err = coll.get("/x", []).unwrap_err();
    assert!(matches!(err, RegistrationError::EmptyHandlers { .. }));
    assert_eq!(coll.len(), 1);
    assert!(coll.route(&MethodKey::Method(Method::GET), "/x").is_none());
}

#[test]
fn test_stage_order_enforced() {
    let trace = Trace::new();
    let mut coll = Collection::new();

    let err = coll
        .post("/x", [Stage::middleware(trace.enter("A"))])
        .unwrap_err();
    assert!(matches!(err, RegistrationError::MissingTerminal { .. }));

    let err = coll
        .post("/x", [trace.terminal("H"), trace.terminal("H2")])
        .unwrap_err();
    assert!(matches!(err, RegistrationError::MisplacedHandler { position: 0, .. }));
    assert!(coll.is_empty());
}

#[test]
fn test_malformed_pattern_rejected() {
    let mut coll = Collection::new();
    let err = coll
        .get("no-slash", [Stage::call(|_| Ok(HandlerResponse::default()))])
        .unwrap_err();
    assert!(matches!(err, RegistrationError::MalformedPattern { .. }));
    assert!(coll.is_empty());
}

#[test]
fn test_bad_placeholder_regex_rejected_at_registration() {
    let mut coll = Collection::new();
    let err = coll
        .get("/x/{id:[}", [Stage::call(|_| Ok(HandlerResponse::default()))])
        .unwrap_err();
    assert!(matches!(err, RegistrationError::MalformedPattern { .. }));
    assert!(coll.is_empty());
}

#[test]
fn test_same_method_and_pattern_replaces() {
    let trace = Trace::new();
    let mut app = Application::new();
    let mut coll = Collection::new();
    coll.get("/p", [trace.terminal("first")]).unwrap();
    coll.get("/other", [trace.terminal("other")]).unwrap();
    coll.get("/p", [trace.terminal("second")]).unwrap();

    assert_eq!(coll.len(), 2);
    let patterns: Vec<_> = coll.routes().map(|(_, r)| r.pattern().to_string()).collect();
    assert_eq!(patterns, ["/p", "/other"]);

    app.mount(&coll).unwrap();
    assert_eq!(app.handle(get("/p")).unwrap().body, "second");
}

#[test]
fn test_map_via_routes_are_independent() {
    let trace = Trace::new();
    let mut coll = Collection::new();
    coll.map_via(
        "/both",
        &[Method::GET, Method::POST],
        [Stage::middleware(trace.enter("shared")), trace.terminal("H")],
    )
    .unwrap();

    let get_key = MethodKey::Method(Method::GET);
    let post_key = MethodKey::Method(Method::POST);
    coll.route_mut(&get_key, "/both")
        .unwrap()
        .add_middleware(trace.enter("get-only"));

    let get_route = coll.route(&get_key, "/both").unwrap();
    let post_route = coll.route(&post_key, "/both").unwrap();
    assert_ne!(get_route.id(), post_route.id());
    assert_eq!(get_route.middlewares().len(), 2);
    assert_eq!(post_route.middlewares().len(), 1);

    let mut app = Application::new();
    app.mount(&coll).unwrap();
    app.handle(request(Method::POST, "/both")).unwrap();
    assert_eq!(trace.take(), ["shared", "H"]);
    app.handle(get("/both")).unwrap();
    assert_eq!(trace.take(), ["shared", "get-only", "H"]);
}

#[test]
fn test_map_via_without_methods_rejected() {
    let mut coll = Collection::new();
    let err = coll
        .map_via("/x", &[], [Stage::call(|_| Ok(HandlerResponse::default()))])
        .unwrap_err();
    assert!(matches!(err, RegistrationError::NoMethods { .. }));
    assert!(coll.is_empty());
}

#[test]
fn test_add_map_none_goes_to_any_bucket() {
    let mut coll = Collection::new();
    coll.add_map(None, "/x", [Stage::call(|_| Ok(HandlerResponse::default()))])
        .unwrap();
    assert!(coll.route(&MethodKey::Any, "/x").is_some());
    assert_eq!(coll.bucket(&MethodKey::Method(Method::GET)).count(), 0);
}

#[test]
fn test_mount_rejects_empty_collection() {
    let mut app = Application::new();
    let err = app.mount(&Collection::new()).unwrap_err();
    assert!(matches!(err, MountError::EmptyCollection { .. }));
}

#[test]
fn test_mount_rejects_action_without_main_handler() {
    let mut app = Application::new();
    let mut coll = Collection::new();
    coll.get("/", ["index".into()]).unwrap();

    let err = app.mount(&coll).unwrap_err();
    assert!(matches!(err, MountError::MissingMainHandler { .. }));
    assert!(app.registry().is_empty());
}

#[test]
fn test_mount_rejects_unknown_service_eagerly() {
    let mut app = Application::new();
    let mut coll = Collection::new();
    coll.set_handler(MainHandler::service("ghost"));
    coll.get("/", ["index".into()]).unwrap();

    let err = app.mount(&coll).unwrap_err();
    assert!(matches!(err, MountError::Resolve(_)));
    assert!(app.registry().is_empty());
}

#[test]
fn test_remount_replaces_units_and_picks_up_group_middleware() {
    let trace = Trace::new();
    let mut app = Application::new();
    let mut coll = Collection::new();
    coll.set_prefix("/g");
    coll.get("/x", [trace.terminal("H")]).unwrap();
    app.mount(&coll).unwrap();

    coll.add_middleware(trace.enter("G"));
    app.mount(&coll).unwrap();

    assert_eq!(app.registry().len(), 1);
    app.handle(get("/g/x")).unwrap();
    assert_eq!(trace.take(), ["G", "H"]);
}

#[test]
fn test_remount_drops_units_the_collection_no_longer_has() {
    let trace = Trace::new();
    let mut app = Application::new();
    app.get("/v1/other", [trace.terminal("app")]).unwrap();

    let mut coll = Collection::new();
    coll.set_prefix("/v1");
    coll.get("/a", [trace.terminal("a")]).unwrap();
    coll.get("/b", [trace.terminal("b")]).unwrap();
    app.mount(&coll).unwrap();
    assert_eq!(app.registry().len(), 3);

    coll.clear();
    coll.set_prefix("/v2").add_middleware(trace.enter("G"));
    coll.get("/a", [trace.terminal("a")]).unwrap();
    app.mount(&coll).unwrap();

    assert_eq!(app.registry().len(), 2);
    assert_eq!(app.handle(get("/v1/a")).unwrap().status, 404);
    assert_eq!(app.handle(get("/v1/b")).unwrap().status, 404);
    assert_eq!(app.handle(get("/v1/other")).unwrap().body, "app");
    app.handle(get("/v2/a")).unwrap();
    assert_eq!(trace.take(), ["app", "G", "a"]);
}

#[test]
fn test_prefix_applies_to_root_route() {
    let trace = Trace::new();
    let mut app = Application::new();
    let mut coll = Collection::new();
    coll.set_prefix("/api");
    coll.get("/", [trace.terminal("root")]).unwrap();
    app.mount(&coll).unwrap();

    assert!(app
        .registry()
        .get(&MethodKey::Method(Method::GET), "/api")
        .is_some());
    assert_eq!(app.handle(get("/api")).unwrap().body, "root");
}

#[test]
fn test_remove_route_by_id() {
    let mut app = Application::new();
    let id = app
        .get("/gone", [Stage::call(|_| Ok(HandlerResponse::default()))])
        .unwrap();
    assert!(app.remove_route(id).unwrap());
    assert!(!app.remove_route(id).unwrap());
    assert_eq!(app.handle(get("/gone")).unwrap().status, 404);
}

#[test]
fn test_app_level_action_rejected() {
    let mut app = Application::new();
    let err = app.get("/", ["index".into()]).unwrap_err();
    assert!(matches!(err, RegistrationError::ActionWithoutController { .. }));
}

#[test]
fn test_app_level_map_via() {
    let mut app = Application::new();
    let ids = app
        .map_via(
            "/m",
            &[Method::PUT, Method::DELETE],
            [Stage::call(|req| Ok(HandlerResponse::from(req.method.to_string())))],
        )
        .unwrap();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(app.handle(request(Method::PUT, "/m")).unwrap().body, "PUT");
    assert_eq!(app.handle(get("/m")).unwrap().status, 404);
}

#[test]
fn test_setup_rejected_after_first_dispatch() {
    let trace = Trace::new();
    let mut app = Application::new();
    app.get("/", [trace.terminal("H")]).unwrap();
    app.handle(get("/")).unwrap();

    assert!(matches!(
        app.before(trace.enter("late")).unwrap_err(),
        MountError::AfterDispatch
    ));
    assert!(matches!(
        app.get("/late", [trace.terminal("H")]).unwrap_err(),
        RegistrationError::AfterDispatch
    ));
    let mut coll = Collection::new();
    coll.get("/c", [trace.terminal("H")]).unwrap();
    assert!(matches!(app.mount(&coll).unwrap_err(), MountError::AfterDispatch));
}

#[test]
fn test_route_table_lists_every_unit() {
    let mut app = Application::new();
    let mut coll = Collection::named("users");
    coll.set_prefix("/users")
        .set_handler(MainHandler::factory(|| {
            anyhow::bail!("not needed for listing")
        }))
        .set_lazy(true);
    coll.get("/", ["index".into()]).unwrap();
    coll.get("/{id}", ["show".into()]).unwrap();
    app.mount(&coll).unwrap();
    app.map("/health", [Stage::call(|_| Ok(HandlerResponse::default()))])
        .unwrap();

    let table = app.route_table();
    assert_eq!(table.len(), 3);
    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json[0]["pattern"], "/users");
    assert_eq!(json[1]["pattern"], "/users/{id}");

    let lines = app.registry().route_lines();
    assert!(lines.iter().any(|l| l.contains("#show") && l.contains("users")));
}
