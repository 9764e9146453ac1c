//! # Application
//!
//! Owns the application-wide middleware stacks, the not-found and error
//! handlers and the registry collections are mounted into, and drives
//! dispatch.
//!
//! ## Lifecycle
//!
//! Setup (`mount`, `before`, route shortcuts, ...) needs `&mut self`;
//! dispatch needs only `&self`, so a fully configured application is shared
//! as `Arc<Application>` across threads. The first `handle()` call ends the
//! setup phase: later setup calls fail with an `AfterDispatch` error.
//!
//! ## Dispatch
//!
//! ```text
//! handle ─► match ──► before ─► group ─► route ─► terminal
//!             │                                      │
//!             │       before ◄─ group ◄─ route ◄─────┘
//!             │          │
//!             └► not found ─► after ─► finish ─► HEAD body cleared
//! ```
//!
//! A stage that calls [`HandlerRequest::stop`] skips everything that has not
//! started yet, including the after stage. Finish handlers always run.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Method;
use tracing::{debug, error, info, warn};

use crate::container::{Container, ControllerResolver};
use crate::dispatcher::{
    ActiveHandler, ActiveTarget, HandlerRequest, HandlerResponse, HandlerResult, Link, Next, Scope,
};
use crate::error::{DispatchError, MountError, RegistrationError};
use crate::handler::{self, ErrorHandler, Handler, Stage, TerminalHandler};
use crate::ids::RouteId;
use crate::middleware::Middleware;
use crate::router::{
    Collection, DispatchUnit, MethodFilter, MethodKey, Origin, PathMatcher, RegexPathMatcher,
    Registry, Route, RouteInfo,
};
use crate::runtime_config::RuntimeConfig;

macro_rules! app_method_shortcut {
    ($($fn_name:ident => $method:expr, $label:literal;)+) => {
        $(
            #[doc = concat!("Register an application-level `", $label, "` route.")]
            ///
            /// # Errors
            ///
            /// See [`Application::add_route`].
            pub fn $fn_name<I>(&mut self, pattern: &str, stages: I) -> Result<RouteId, RegistrationError>
            where
                I: IntoIterator<Item = Stage>,
            {
                self.add_route(Some($method), pattern, stages)
            }
        )+
    };
}

/// Route-matching and middleware-dispatch engine.
pub struct Application {
    before: Vec<Arc<dyn Middleware>>,
    after: Vec<Arc<dyn Middleware>>,
    finish: Vec<Arc<dyn Middleware>>,
    not_found: Option<Arc<dyn Handler>>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
    registry: Registry,
    matcher: Arc<dyn PathMatcher>,
    resolver: Arc<dyn ControllerResolver>,
    config: RuntimeConfig,
    dispatched: AtomicBool,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .field("finish", &self.finish.len())
            .field("not_found", &self.not_found.is_some())
            .field("error_handler", &self.error_handler.is_some())
            .field("routes", &self.registry.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Application {
    /// Application with default configuration, the regex matcher and an
    /// empty [`Container`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            before: Vec::new(),
            after: Vec::new(),
            finish: Vec::new(),
            not_found: None,
            error_handler: None,
            registry: Registry::new(),
            matcher: Arc::new(RegexPathMatcher),
            resolver: Arc::new(Container::new()),
            config,
            dispatched: AtomicBool::new(false),
        }
    }

    /// Replace the path matcher. Patterns mounted earlier keep the matcher
    /// they were compiled with.
    #[must_use]
    pub fn with_matcher(mut self, matcher: Arc<dyn PathMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Replace the resolver used for service-id main handlers.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn ControllerResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn route_table(&self) -> Vec<RouteInfo> {
        self.registry.route_table()
    }

    fn is_dispatching(&mut self) -> bool {
        *self.dispatched.get_mut()
    }

    fn ensure_setup(&mut self) -> Result<(), MountError> {
        if self.is_dispatching() {
            return Err(MountError::AfterDispatch);
        }
        Ok(())
    }

    /// Append an application-wide middleware run before any matched route.
    ///
    /// # Errors
    ///
    /// [`MountError::AfterDispatch`] once the application has dispatched.
    pub fn before(&mut self, mw: impl Middleware + 'static) -> Result<&mut Self, MountError> {
        self.ensure_setup()?;
        self.before.push(Arc::new(mw));
        Ok(self)
    }

    /// Append an application-wide middleware run after the route chain.
    ///
    /// # Errors
    ///
    /// [`MountError::AfterDispatch`] once the application has dispatched.
    pub fn after(&mut self, mw: impl Middleware + 'static) -> Result<&mut Self, MountError> {
        self.ensure_setup()?;
        self.after.push(Arc::new(mw));
        Ok(self)
    }

    /// Append a middleware that always runs last, even after errors and
    /// short-circuits. Its response is observed, never returned.
    ///
    /// # Errors
    ///
    /// [`MountError::AfterDispatch`] once the application has dispatched.
    pub fn finish(&mut self, mw: impl Middleware + 'static) -> Result<&mut Self, MountError> {
        self.ensure_setup()?;
        self.finish.push(Arc::new(mw));
        Ok(self)
    }

    /// Handler producing the response when no route matches.
    ///
    /// # Errors
    ///
    /// [`MountError::AfterDispatch`] once the application has dispatched.
    pub fn not_found<F>(&mut self, f: F) -> Result<&mut Self, MountError>
    where
        F: Fn(&mut HandlerRequest) -> HandlerResult + Send + Sync + 'static,
    {
        self.set_not_found_handler(Arc::new(handler::from_fn(f)))
    }

    /// # Errors
    ///
    /// [`MountError::AfterDispatch`] once the application has dispatched.
    pub fn set_not_found_handler(&mut self, h: Arc<dyn Handler>) -> Result<&mut Self, MountError> {
        self.ensure_setup()?;
        self.not_found = Some(h);
        Ok(self)
    }

    /// Handler producing the response when a stage failed.
    ///
    /// # Errors
    ///
    /// [`MountError::AfterDispatch`] once the application has dispatched.
    pub fn error<F>(&mut self, f: F) -> Result<&mut Self, MountError>
    where
        F: Fn(&mut HandlerRequest, &DispatchError) -> HandlerResult + Send + Sync + 'static,
    {
        self.set_error_handler(Arc::new(f))
    }

    /// # Errors
    ///
    /// [`MountError::AfterDispatch`] once the application has dispatched.
    pub fn set_error_handler(&mut self, h: Arc<dyn ErrorHandler>) -> Result<&mut Self, MountError> {
        self.ensure_setup()?;
        self.error_handler = Some(h);
        Ok(self)
    }

    /// Flatten a collection into the registry.
    ///
    /// Every route is stored under its fully-qualified pattern together with
    /// the collection's group middleware and main handler. Mounting again
    /// replaces the units for the same (method, pattern) in place and drops
    /// units of routes the collection no longer has, so updated group
    /// middleware takes effect everywhere and nothing is duplicated. The
    /// main handler instance belongs to the collection and survives
    /// remounts. An eager main handler is resolved here; a lazy one on the
    /// first request that needs it.
    ///
    /// # Errors
    ///
    /// [`MountError`] when the collection is empty, an action route has no
    /// main handler, a pattern does not compile or eager resolution fails.
    /// The registry is unchanged on error.
    pub fn mount(&mut self, collection: &Collection) -> Result<&mut Self, MountError> {
        self.ensure_setup()?;
        if collection.is_empty() {
            return Err(MountError::EmptyCollection {
                prefix: collection.prefix().to_string(),
            });
        }

        let slot = collection.slot().cloned();

        let mut prepared = Vec::with_capacity(collection.len());
        for (key, route) in collection.routes() {
            let pattern = collection.full_pattern(route.pattern());
            if slot.is_none() && matches!(route.handler(), TerminalHandler::Action(_)) {
                return Err(MountError::MissingMainHandler { pattern });
            }
            let compiled = self
                .matcher
                .compile(&pattern)
                .map_err(|reason| MountError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason,
                })?;
            prepared.push((key.clone(), route.with_pattern(pattern), compiled));
        }

        if let Some(slot) = &slot {
            if !collection.is_lazy() {
                slot.resolve(self.resolver.as_ref())?;
            }
        }

        let group: Arc<[Arc<dyn Middleware>]> = collection.middlewares().into();
        let origin = Origin {
            id: collection.id(),
            name: collection.name().map(str::to_string),
        };
        let fresh: HashSet<(MethodKey, String)> = prepared
            .iter()
            .map(|(key, route, _)| (key.clone(), route.pattern().to_string()))
            .collect();
        let stale = self.registry.retain(|unit| {
            unit.collection_id() != Some(origin.id)
                || fresh.contains(&(unit.key().clone(), unit.pattern().to_string()))
        });
        let routes_summary: Vec<String> = prepared
            .iter()
            .take(10)
            .map(|(key, route, _)| format!("{key} {}", route.pattern()))
            .collect();
        let routes_count = prepared.len();

        for (key, route, compiled) in prepared {
            self.registry.insert(DispatchUnit::new(
                key,
                route,
                Some(origin.clone()),
                Arc::clone(&group),
                slot.clone(),
                compiled,
            ));
        }

        info!(
            collection = origin.name.as_deref().unwrap_or("-"),
            collection_id = %origin.id,
            prefix = %collection.prefix(),
            routes_count,
            stale_units_dropped = stale,
            lazy = collection.is_lazy(),
            group_middlewares = group.len(),
            routes_summary = ?routes_summary,
            "Collection mounted"
        );
        Ok(self)
    }

    app_method_shortcut! {
        get => Method::GET, "GET";
        post => Method::POST, "POST";
        put => Method::PUT, "PUT";
        patch => Method::PATCH, "PATCH";
        delete => Method::DELETE, "DELETE";
        head => Method::HEAD, "HEAD";
        options => Method::OPTIONS, "OPTIONS";
    }

    /// Register an application-level route answering to every method.
    ///
    /// # Errors
    ///
    /// See [`Application::add_route`].
    pub fn map<I>(&mut self, pattern: &str, stages: I) -> Result<RouteId, RegistrationError>
    where
        I: IntoIterator<Item = Stage>,
    {
        self.add_route(None, pattern, stages)
    }

    /// Register one independent application-level route per method.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::NoMethods`] for an empty method list, otherwise
    /// see [`Application::add_route`].
    pub fn map_via<I>(
        &mut self,
        pattern: &str,
        methods: &[Method],
        stages: I,
    ) -> Result<Vec<RouteId>, RegistrationError>
    where
        I: IntoIterator<Item = Stage>,
    {
        if methods.is_empty() {
            return Err(RegistrationError::NoMethods {
                pattern: pattern.to_string(),
            });
        }
        let template = self.prepare_route(pattern, MethodFilter::Any, stages)?;
        let compiled: Vec<_> = methods
            .iter()
            .map(|_| self.compile_for_registration(pattern))
            .collect::<Result<_, _>>()?;
        Ok(methods
            .iter()
            .zip(compiled)
            .map(|(method, compiled)| {
                let route = template.duplicate(MethodFilter::Only(vec![method.clone()]));
                self.insert_unit(MethodKey::Method(method.clone()), route, compiled)
            })
            .collect())
    }

    /// Register a route directly in the registry, without a collection.
    ///
    /// Application-level routes have no prefix, no group middleware and no
    /// main handler, so their terminal must be a callable.
    ///
    /// # Errors
    ///
    /// [`RegistrationError`] for malformed patterns, invalid stage lists,
    /// action terminals, or registration after the first dispatch.
    pub fn add_route<I>(
        &mut self,
        method: Option<Method>,
        pattern: &str,
        stages: I,
    ) -> Result<RouteId, RegistrationError>
    where
        I: IntoIterator<Item = Stage>,
    {
        let filter = method
            .clone()
            .map_or(MethodFilter::Any, |m| MethodFilter::Only(vec![m]));
        let route = self.prepare_route(pattern, filter, stages)?;
        let compiled = self.compile_for_registration(pattern)?;
        Ok(self.insert_unit(MethodKey::from(method), route, compiled))
    }

    fn prepare_route<I>(
        &mut self,
        pattern: &str,
        filter: MethodFilter,
        stages: I,
    ) -> Result<Route, RegistrationError>
    where
        I: IntoIterator<Item = Stage>,
    {
        if self.is_dispatching() {
            return Err(RegistrationError::AfterDispatch);
        }
        let route = Route::new(pattern, filter, stages)?;
        if let TerminalHandler::Action(action) = route.handler() {
            return Err(RegistrationError::ActionWithoutController {
                pattern: pattern.to_string(),
                action: action.clone(),
            });
        }
        Ok(route)
    }

    fn compile_for_registration(
        &self,
        pattern: &str,
    ) -> Result<Box<dyn crate::router::CompiledPattern>, RegistrationError> {
        self.matcher
            .compile(pattern)
            .map_err(|reason| RegistrationError::MalformedPattern {
                pattern: pattern.to_string(),
                reason,
            })
    }

    fn insert_unit(
        &mut self,
        key: MethodKey,
        route: Route,
        compiled: Box<dyn crate::router::CompiledPattern>,
    ) -> RouteId {
        let id = route.id();
        let unit = DispatchUnit::new(key, route, None, Arc::from(Vec::new()), None, compiled);
        if let Some(previous) = self.registry.insert(unit) {
            warn!(
                method = %previous.key(),
                pattern = %previous.pattern(),
                replaced_route = %previous.route().id(),
                route_id = %id,
                "Route re-registered - replacing previous registration"
            );
        }
        id
    }

    /// Remove a mounted route by id. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// [`MountError::AfterDispatch`] once the application has dispatched.
    pub fn remove_route(&mut self, id: RouteId) -> Result<bool, MountError> {
        self.ensure_setup()?;
        let removed = self.registry.remove(id);
        if let Some(unit) = &removed {
            info!(route_id = %id, pattern = %unit.pattern(), "Route removed");
        }
        Ok(removed.is_some())
    }

    /// Dispatch one request.
    ///
    /// # Errors
    ///
    /// The [`DispatchError`] raised by a stage when no error handler is set,
    /// or [`DispatchError::ErrorHandler`] when the error handler itself
    /// failed. Finish handlers have run in both cases.
    pub fn handle(&self, mut req: HandlerRequest) -> Result<HandlerResponse, DispatchError> {
        if !self.dispatched.load(Ordering::Relaxed) {
            self.dispatched.store(true, Ordering::Relaxed);
        }
        req.reset_context();

        let start = Instant::now();
        info!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            "Dispatch started"
        );

        let outcome = match self.guarded(&mut req, |req| self.run(req)) {
            Ok(res) => Ok(res),
            Err(err) => self.guarded(&mut req, |req| self.recover(req, err)),
        };

        self.run_finish(&mut req, &outcome);

        let mut outcome = outcome;
        if req.is_head() {
            if let Ok(res) = &mut outcome {
                res.clear_body();
            }
        }

        let latency = start.elapsed();
        match &outcome {
            Ok(res) => {
                info!(
                    request_id = %req.request_id,
                    method = %req.method,
                    path = %req.path,
                    status = res.status,
                    stopped = req.is_stopped(),
                    latency_ms = latency.as_millis() as u64,
                    "Dispatch complete"
                );
                if latency > Duration::from_millis(self.config.slow_dispatch_ms) {
                    warn!(
                        request_id = %req.request_id,
                        path = %req.path,
                        route_pattern = req.route_pattern.as_deref().unwrap_or("-"),
                        latency_ms = latency.as_millis() as u64,
                        threshold_ms = self.config.slow_dispatch_ms,
                        "Slow dispatch detected"
                    );
                }
            }
            Err(err) => error!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                error = %err,
                latency_ms = latency.as_millis() as u64,
                "Dispatch failed"
            ),
        }
        outcome
    }

    fn normalize_path<'p>(&self, path: &'p str) -> &'p str {
        if path.is_empty() {
            return "/";
        }
        if self.config.strip_trailing_slash && path.len() > 1 {
            let trimmed = path.trim_end_matches('/');
            return if trimmed.is_empty() { "/" } else { trimmed };
        }
        path
    }

    fn lookup(&self, req: &HandlerRequest) -> Option<crate::router::RouteMatch> {
        let path = self.normalize_path(&req.path);
        self.registry.resolve(&req.method, path).or_else(|| {
            if req.is_head() && self.config.head_falls_back_to_get {
                debug!(request_id = %req.request_id, path = %path, "HEAD falling back to GET");
                self.registry.resolve(&Method::GET, path)
            } else {
                None
            }
        })
    }

    /// Match, then run the before/group/route onion and the after stage.
    fn run(&self, req: &mut HandlerRequest) -> Result<HandlerResponse, DispatchError> {
        let Some(route_match) = self.lookup(req) else {
            warn!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                "No route matched"
            );
            let res = match &self.not_found {
                Some(h) => h.call(req).map_err(DispatchError::from_chain)?,
                None => HandlerResponse::error(404, "Not Found"),
            };
            return self.run_after(req, res);
        };

        let unit = route_match.unit;
        req.route_pattern = Some(unit.pattern().to_string());
        req.path_params = route_match.path_params;

        let route = unit.route();
        let target = match route.handler() {
            TerminalHandler::Callable(_) => ActiveTarget::Callable,
            TerminalHandler::Action(action) => ActiveTarget::Action(action.clone()),
        };
        req.set_active_handler(ActiveHandler {
            route_id: route.id(),
            pattern: unit.pattern().to_string(),
            target,
        });

        let controller = match route.handler() {
            TerminalHandler::Callable(_) => None,
            TerminalHandler::Action(_) => {
                let slot = unit
                    .slot()
                    .ok_or_else(|| DispatchError::MissingMainHandler {
                        pattern: unit.pattern().to_string(),
                    })?;
                Some(slot.resolve(self.resolver.as_ref())?)
            }
        };

        let endpoint = |req: &mut HandlerRequest| -> HandlerResult {
            match (route.handler(), &controller) {
                (TerminalHandler::Callable(h), _) => h.call(req),
                (TerminalHandler::Action(action), Some(controller)) => controller
                    .call_action(action, req)
                    .unwrap_or_else(|| {
                        Err(DispatchError::UnknownAction {
                            action: action.clone(),
                        }
                        .into())
                    }),
                (TerminalHandler::Action(_), None) => Err(DispatchError::MissingMainHandler {
                    pattern: route.pattern().to_string(),
                }
                .into()),
            }
        };

        let links: Vec<Link<'_>> = scoped(Scope::Before, &self.before)
            .chain(scoped(Scope::Collection, unit.group_middlewares()))
            .chain(scoped(Scope::Route, route.middlewares()))
            .collect();

        let res = Next::new(&links, &endpoint)
            .run(req)
            .map_err(DispatchError::from_chain)?;

        if req.is_stopped() {
            debug!(
                request_id = %req.request_id,
                route_pattern = %unit.pattern(),
                status = res.status,
                "Chain short-circuited - skipping after stage"
            );
            return Ok(res);
        }
        self.run_after(req, res)
    }

    fn run_after(
        &self,
        req: &mut HandlerRequest,
        res: HandlerResponse,
    ) -> Result<HandlerResponse, DispatchError> {
        if req.is_stopped() || self.after.is_empty() {
            return Ok(res);
        }
        let endpoint = |_: &mut HandlerRequest| -> HandlerResult { Ok(res.clone()) };
        let links: Vec<Link<'_>> = scoped(Scope::After, &self.after).collect();
        Next::new(&links, &endpoint)
            .run(req)
            .map_err(DispatchError::from_chain)
    }

    fn recover(
        &self,
        req: &mut HandlerRequest,
        err: DispatchError,
    ) -> Result<HandlerResponse, DispatchError> {
        let Some(handler) = &self.error_handler else {
            return Err(err);
        };
        warn!(
            request_id = %req.request_id,
            error = %err,
            "Stage failed - invoking error handler"
        );
        handler
            .handle(req, &err)
            .map_err(|source| DispatchError::ErrorHandler {
                original: Box::new(err),
                source,
            })
    }

    /// Finish handlers see the final response (or a 500 describing the
    /// error). Each one runs on its own, with the stop flag cleared, so a
    /// failing, stopping or non-continuing finish handler never skips the
    /// next one. Their results never change the outcome.
    fn run_finish(
        &self,
        req: &mut HandlerRequest,
        outcome: &Result<HandlerResponse, DispatchError>,
    ) {
        if self.finish.is_empty() {
            return;
        }
        let stopped = req.is_stopped();

        let observed = match outcome {
            Ok(res) => res.clone(),
            Err(err) => HandlerResponse::error(500, &err.to_string()),
        };
        let endpoint = |_: &mut HandlerRequest| -> HandlerResult { Ok(observed.clone()) };

        for (position, mw) in self.finish.iter().enumerate() {
            req.resume();
            let link = [Link::new(Scope::Finish, mw.as_ref())];
            let result = self.guarded(req, |req| {
                Next::new(&link, &endpoint)
                    .run(req)
                    .map_err(DispatchError::from_chain)
            });
            if let Err(err) = result {
                warn!(
                    request_id = %req.request_id,
                    position,
                    error = %err,
                    "Finish handler failed - continuing"
                );
            }
        }

        req.resume();
        if stopped {
            req.stop();
        }
    }

    /// Run `f`, turning a panic into [`DispatchError::Panicked`] when
    /// `catch_panics` is enabled.
    fn guarded<F>(&self, req: &mut HandlerRequest, f: F) -> Result<HandlerResponse, DispatchError>
    where
        F: FnOnce(&mut HandlerRequest) -> Result<HandlerResponse, DispatchError>,
    {
        if !self.config.catch_panics {
            return f(req);
        }
        let request_id = req.request_id;
        let route_pattern = req.route_pattern.clone();
        panic::catch_unwind(AssertUnwindSafe(|| f(req))).unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            error!(
                request_id = %request_id,
                route_pattern = route_pattern.as_deref().unwrap_or("-"),
                panic_message = %message,
                "Handler panicked - CRITICAL"
            );
            Err(DispatchError::Panicked { message })
        })
    }
}

fn scoped<'a>(
    scope: Scope,
    middlewares: &'a [Arc<dyn Middleware>],
) -> impl Iterator<Item = Link<'a>> + 'a {
    middlewares
        .iter()
        .map(move |mw| Link::new(scope, mw.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn application_is_shareable() {
        assert_send_sync::<Application>();
    }

    #[test]
    fn normalize_path_strips_trailing_slashes() {
        let app = Application::new();
        assert_eq!(app.normalize_path(""), "/");
        assert_eq!(app.normalize_path("/"), "/");
        assert_eq!(app.normalize_path("//"), "/");
        assert_eq!(app.normalize_path("/users/"), "/users");

        let app = Application::with_config(RuntimeConfig {
            strip_trailing_slash: false,
            ..RuntimeConfig::default()
        });
        assert_eq!(app.normalize_path("/users/"), "/users/");
    }

    #[test]
    fn panic_payloads_are_readable() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&42_u8), "unknown panic payload");
    }

    #[test]
    fn app_level_action_routes_are_rejected() {
        let mut app = Application::new();
        let err = app.get("/x", ["index".into()]).unwrap_err();
        assert!(matches!(err, RegistrationError::ActionWithoutController { .. }));
        assert!(app.registry().is_empty());
    }
}
