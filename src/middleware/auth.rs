use tracing::debug;

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse, HandlerResult, Next};

/// Static bearer token check.
///
/// A request without `Authorization: Bearer <token>` is stopped and answered
/// with 401; nothing downstream runs.
pub struct AuthMiddleware {
    token: String,
}

impl AuthMiddleware {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    fn accepts(&self, header: Option<&str>) -> bool {
        header
            .and_then(|h| h.strip_prefix("Bearer "))
            .is_some_and(|t| t == self.token)
    }
}

impl Middleware for AuthMiddleware {
    fn invoke(&self, req: &mut HandlerRequest, next: Next<'_>) -> HandlerResult {
        if self.accepts(req.get_header("authorization")) {
            return next.run(req);
        }
        debug!(request_id = %req.request_id, path = %req.path, "Rejected unauthenticated request");
        req.stop();
        Ok(HandlerResponse::error(401, "Unauthorized"))
    }
}
