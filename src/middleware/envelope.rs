use serde_json::{json, Value};

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResult, Next};

/// Wraps the downstream JSON body as `{"data": body}`.
///
/// Empty bodies and 204 responses from a stopped chain pass through untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvelopeMiddleware;

impl Middleware for EnvelopeMiddleware {
    fn invoke(&self, req: &mut HandlerRequest, next: Next<'_>) -> HandlerResult {
        let mut res = next.run(req)?;
        if res.has_body() {
            let body = std::mem::replace(&mut res.body, Value::Null);
            res.body = json!({ "data": body });
        }
        Ok(res)
    }
}
