//! Dispatcher core module - request/response types and the per-request
//! dispatch context.
//!
//! Everything that changes while one request is being dispatched (the stop
//! flag, the active handler, captured placeholders) lives on the
//! [`HandlerRequest`]. The long-lived [`Application`](crate::app::Application)
//! never stores request-scoped state, which keeps concurrent `handle()` calls
//! on one instance isolated from each other.

use crate::ids::{RequestId, RouteId};
use crate::router::ParamVec;
use http::Method;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// Maximum inline headers before heap allocation.
/// Most requests have ≤16 headers.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage.
///
/// Header names use `Arc<str>` because they repeat across requests
/// (Content-Type, Authorization, ...) and `Arc::clone()` is an atomic
/// increment instead of a string copy.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Result type shared by middleware, terminal handlers and hooks.
pub type HandlerResult = anyhow::Result<HandlerResponse>;

/// What the matched route will run as its terminal stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ActiveTarget {
    /// A callable registered directly on the route
    Callable,
    /// A named action on the collection's main handler
    Action(String),
}

/// Read-only description of the handler selected for the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveHandler {
    pub route_id: RouteId,
    /// Fully-qualified pattern (collection prefix included)
    pub pattern: String,
    pub target: ActiveTarget,
}

/// Request-scoped dispatch state.
#[derive(Debug, Clone, Default)]
pub struct DispatchContext {
    stopped: bool,
    active_handler: Option<ActiveHandler>,
}

impl DispatchContext {
    pub(crate) fn reset(&mut self) {
        self.stopped = false;
        self.active_handler = None;
    }
}

/// Request flowing through the middleware chain.
///
/// Created fresh for every dispatch. Middleware receives it mutably so it can
/// annotate headers/body, read the captured placeholders and call
/// [`stop`](HandlerRequest::stop).
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path, without query string
    pub path: String,
    /// Fully-qualified pattern of the matched route, once matched
    pub route_pattern: Option<String>,
    /// Placeholders captured from the path (e.g., `{id}` → `("id", "123")`)
    pub path_params: ParamVec,
    /// Query string parameters
    pub query_params: ParamVec,
    /// HTTP headers (stack-allocated for ≤16 headers)
    pub headers: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
    context: DispatchContext,
}

impl HandlerRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            route_pattern: None,
            path_params: ParamVec::new(),
            query_params: ParamVec::new(),
            headers: HeaderVec::new(),
            body: None,
            context: DispatchContext::default(),
        }
    }

    /// Build a request from a method token such as `"GET"`.
    ///
    /// # Errors
    ///
    /// Returns an error when the token is not a valid HTTP method.
    pub fn from_parts(method: &str, path: impl Into<String>) -> Result<Self, http::method::InvalidMethod> {
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
        Ok(Self::new(method, path))
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_query_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query_params.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    #[inline]
    #[must_use]
    pub fn is_method(&self, method: &Method) -> bool {
        self.method == *method
    }

    #[inline]
    #[must_use]
    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics: if duplicate parameter names exist
    /// at different path depths (e.g., `/org/{id}/team/{team_id}/user/{id}`),
    /// returns the last occurrence.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name ("last write wins")
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Convert path_params to HashMap
    /// Note: This allocates - use get_path_param() on the dispatch path
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Stop the remaining chain stages.
    ///
    /// Stages that have not started yet are skipped and dispatch moves
    /// straight to the finish handlers. A middleware that stops should
    /// return its own response instead of calling `next`.
    pub fn stop(&mut self) {
        self.context.stopped = true;
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.context.stopped
    }

    /// The handler selected for this request, once a route matched.
    #[must_use]
    pub fn active_handler(&self) -> Option<&ActiveHandler> {
        self.context.active_handler.as_ref()
    }

    pub(crate) fn set_active_handler(&mut self, active: ActiveHandler) {
        self.context.active_handler = Some(active);
    }

    pub(crate) fn reset_context(&mut self) {
        self.context.reset();
        self.route_pattern = None;
        self.path_params.clear();
    }

    pub(crate) fn resume(&mut self) {
        self.context.stopped = false;
    }
}

/// Response produced by the chain.
///
/// Contains the HTTP status code, headers, and JSON body. Serialization to a
/// wire format is left to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers (stack-allocated for ≤16 headers)
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body as JSON; `Value::Null` means no body
    pub body: Value,
}

impl Default for HandlerResponse {
    fn default() -> Self {
        Self::new(200, HeaderVec::new(), Value::Null)
    }
}

impl HandlerResponse {
    /// Create a new response with the given status, headers, and body
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with default headers
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// 200 JSON response
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self::json(200, body)
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// Empty response returned by `Next::run` once the chain was stopped.
    #[must_use]
    pub fn no_content() -> Self {
        Self::new(204, HeaderVec::new(), Value::Null)
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        // Remove existing header with same name (case-insensitive)
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    #[must_use]
    pub fn has_body(&self) -> bool {
        !self.body.is_null()
    }

    /// Drop the body, keeping status and headers.
    pub fn clear_body(&mut self) {
        self.body = Value::Null;
    }
}

impl From<Value> for HandlerResponse {
    fn from(body: Value) -> Self {
        Self::ok(body)
    }
}

impl From<&str> for HandlerResponse {
    fn from(body: &str) -> Self {
        Self::ok(Value::String(body.to_string()))
    }
}

impl From<String> for HandlerResponse {
    fn from(body: String) -> Self {
        Self::ok(Value::String(body))
    }
}
