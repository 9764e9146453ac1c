use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use http::Method;
use stackroute::dispatcher::{HandlerRequest, HandlerResponse};
use stackroute::handler::Stage;
use stackroute::middleware::from_fn;
use stackroute::router::Collection;
use stackroute::Application;

fn echo_param(name: &'static str) -> Stage {
    Stage::call(move |req| {
        Ok(HandlerResponse::from(
            req.get_path_param(name).unwrap_or_default().to_string(),
        ))
    })
}

fn zoo_application() -> Application {
    let mut app = Application::new();
    app.before(from_fn(|req, next| next.run(req)))
        .expect("before middleware");

    let mut zoo = Collection::named("zoo");
    zoo.set_prefix("/zoo");
    zoo.add_middleware(from_fn(|req, next| next.run(req)));
    zoo.get("/animals", [echo_param("id")]).expect("route");
    zoo.post("/animals", [echo_param("id")]).expect("route");
    zoo.get("/animals/{id}", [echo_param("id")]).expect("route");
    zoo.put("/animals/{id}", [echo_param("id")]).expect("route");
    zoo.delete("/animals/{id}", [echo_param("id")]).expect("route");
    zoo.get("/animals/{id}/toys/{toy_id}", [echo_param("toy_id")])
        .expect("route");
    zoo.get(
        "/{category}/animals/{id}/habitats/{habitat_id}/sections/{section_id}",
        [echo_param("section_id")],
    )
    .expect("route");
    app.mount(&zoo).expect("mount");

    app.post(
        "/inventory/{warehouse_id}/feeds/{feed_id}/items/{item_id}/batches/{batch_id}",
        [echo_param("batch_id")],
    )
    .expect("route");
    app.get("/complex/{a}/{b}/{c}/{d}/{e}/{f}/{g}/{h}/{i}", [echo_param("i")])
        .expect("route");
    app.head("/zoo/health", [Stage::call(|_| Ok(HandlerResponse::default()))])
        .expect("route");
    app
}

fn bench_route_resolution(c: &mut Criterion) {
    let app = zoo_application();
    let test_paths = [
        (Method::GET, "/zoo/animals/123"),
        (Method::GET, "/zoo/animals/123/toys/456"),
        (Method::GET, "/zoo/cats/animals/123/habitats/88/sections/5"),
        (Method::POST, "/inventory/1/feeds/2/items/3/batches/4"),
        (Method::GET, "/complex/1/2/3/4/5/6/7/8/9"),
    ];
    c.bench_function("route_match", |b| {
        b.iter(|| {
            for (method, path) in &test_paths {
                black_box(app.registry().resolve(method, path));
            }
        })
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let app = zoo_application();
    c.bench_function("dispatch_through_chain", |b| {
        b.iter(|| {
            let res = app.handle(HandlerRequest::new(Method::GET, "/zoo/animals/123"));
            black_box(res)
        })
    });
    c.bench_function("dispatch_not_found", |b| {
        b.iter(|| {
            let res = app.handle(HandlerRequest::new(Method::GET, "/nowhere"));
            black_box(res)
        })
    });
}

criterion_group!(benches, bench_route_resolution, bench_dispatch);
criterion_main!(benches);
