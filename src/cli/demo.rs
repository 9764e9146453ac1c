//! A small application wired with every kind of stage, used by the CLI.

use std::sync::Arc;

use anyhow::Context;
use serde_json::{json, Value};

use crate::app::Application;
use crate::container::Container;
use crate::dispatcher::{HandlerRequest, HandlerResponse, HandlerResult};
use crate::error::DispatchError;
use crate::handler::{Controller, MainHandler, Stage};
use crate::middleware::{
    from_fn, AuthMiddleware, EnvelopeMiddleware, MetricsMiddleware, TracingMiddleware,
};
use crate::router::Collection;
use crate::runtime_config::RuntimeConfig;

/// Bearer token accepted by the demo's `/admin` collection.
pub const DEMO_ADMIN_TOKEN: &str = "letmein";

/// In-memory users controller.
struct UsersController {
    users: Vec<Value>,
}

impl UsersController {
    fn new() -> Self {
        Self {
            users: vec![
                json!({ "id": 1, "name": "ada" }),
                json!({ "id": 2, "name": "grace" }),
            ],
        }
    }

    fn show(&self, req: &HandlerRequest) -> HandlerResult {
        let id: u64 = req
            .get_path_param("id")
            .unwrap_or_default()
            .parse()
            .context("user id must be numeric")?;
        Ok(self
            .users
            .iter()
            .find(|u| u["id"] == id)
            .map_or_else(
                || HandlerResponse::error(404, "No such user"),
                |u| HandlerResponse::ok(u.clone()),
            ))
    }
}

impl Controller for UsersController {
    fn call_action(&self, action: &str, req: &mut HandlerRequest) -> Option<HandlerResult> {
        let result = match action {
            "index" => Ok(HandlerResponse::ok(Value::Array(self.users.clone()))),
            "show" => self.show(req),
            "create" => {
                let body = req.body.clone().unwrap_or(Value::Null);
                Ok(HandlerResponse::json(201, json!({ "created": body })))
            }
            _ => return None,
        };
        Some(result)
    }
}

/// Build the demo application.
///
/// Routes:
///
/// - `GET /` and `GET /health` (application-level)
/// - `GET /users`, `POST /users`, `GET /users/{id:[0-9]+}`: lazy controller
///   resolved through the container, wrapped in `{"data": ...}`
/// - `GET|POST /admin/stats`: bearer-token protected
///
/// # Errors
///
/// Fails only if the demo's own registration is inconsistent.
pub fn demo_application(config: RuntimeConfig) -> anyhow::Result<Application> {
    let container = Arc::new(Container::new());
    container.set_shared("users", || Ok(Arc::new(UsersController::new()) as Arc<dyn Controller>));

    let metrics = Arc::new(MetricsMiddleware::new());
    let mut app = Application::with_config(config).with_resolver(container);

    app.before(TracingMiddleware)?;
    app.finish(from_fn(|req, next| {
        let res = next.run(req)?;
        tracing::debug!(request_id = %req.request_id, status = res.status, "Request finished");
        Ok(res)
    }))?;
    app.not_found(|req| {
        Ok(HandlerResponse::json(
            404,
            json!({ "error": "Not Found", "path": req.path }),
        ))
    })?;
    app.error(|_req, err: &DispatchError| {
        Ok(HandlerResponse::json(500, json!({ "error": err.to_string() })))
    })?;

    app.get("/", [Stage::call(|_| Ok(HandlerResponse::ok(json!({ "service": "stackroute" }))))])?;
    let health_metrics = Arc::clone(&metrics);
    app.get(
        "/health",
        [Stage::call(move |_| {
            Ok(HandlerResponse::ok(json!({
                "status": "ok",
                "requests": health_metrics.request_count(),
            })))
        })],
    )?;

    let mut users = Collection::named("users");
    users
        .set_prefix("/users")
        .set_handler(MainHandler::service("users"))
        .set_lazy(true)
        .add_middleware(EnvelopeMiddleware);
    users.get("/", ["index".into()])?;
    users.post("/", ["create".into()])?;
    users.get("/{id:[0-9]+}", ["show".into()])?;
    app.mount(&users)?;

    let mut admin = Collection::named("admin");
    admin
        .set_prefix("/admin")
        .add_middleware(AuthMiddleware::new(DEMO_ADMIN_TOKEN));
    let stats_metrics = Arc::clone(&metrics);
    admin.map_via(
        "/stats",
        &[http::Method::GET, http::Method::POST],
        [
            Stage::Middleware(metrics),
            Stage::call(move |_| {
                Ok(HandlerResponse::ok(json!({
                    "requests": stats_metrics.request_count(),
                    "errors": stats_metrics.error_count(),
                    "average_latency_us": stats_metrics.average_latency().as_micros() as u64,
                })))
            }),
        ],
    )?;
    app.mount(&admin)?;

    Ok(app)
}
