use std::time::Instant;

use tracing::{debug, field, info_span};

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResult, Next};

/// Opens a `request` span around the downstream stages and records the
/// final status and latency on it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn invoke(&self, req: &mut HandlerRequest, next: Next<'_>) -> HandlerResult {
        let span = info_span!(
            "request",
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            route = field::Empty,
            status = field::Empty,
            latency_ms = field::Empty,
        );
        if let Some(active) = req.active_handler() {
            span.record("route", active.pattern.as_str());
        }

        let start = Instant::now();
        let result = span.in_scope(|| next.run(req));
        let latency_ms = start.elapsed().as_millis() as u64;

        span.record("latency_ms", latency_ms);
        match &result {
            Ok(res) => {
                span.record("status", res.status);
                span.in_scope(|| debug!(status = res.status, latency_ms, "Request span closed"));
            }
            Err(err) => {
                span.in_scope(|| debug!(error = %err, latency_ms, "Request span closed with error"));
            }
        }
        result
    }
}
