//! Onion-style middleware chain.
//!
//! A chain is a borrowed slice of [`Link`]s plus a terminal endpoint.
//! [`Next::run`] consumes the continuation, so a middleware can call it at
//! most once: zero times short-circuits, once passes through.

use std::fmt;

use tracing::debug;

use super::core::{HandlerRequest, HandlerResponse, HandlerResult};
use crate::middleware::Middleware;

/// Where a middleware was registered. Used for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Application-wide before stage
    Before,
    /// Collection (group) middleware
    Collection,
    /// Route-level middleware
    Route,
    /// Application-wide after stage
    After,
    /// Application-wide finish stage
    Finish,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Before => "before",
            Scope::Collection => "collection",
            Scope::Route => "route",
            Scope::After => "after",
            Scope::Finish => "finish",
        };
        f.write_str(name)
    }
}

/// One middleware in a chain, tagged with the scope it came from.
#[derive(Clone, Copy)]
pub struct Link<'a> {
    pub scope: Scope,
    pub middleware: &'a dyn Middleware,
}

impl<'a> Link<'a> {
    #[must_use]
    pub fn new(scope: Scope, middleware: &'a dyn Middleware) -> Self {
        Self { scope, middleware }
    }
}

/// Terminal stage of a chain.
pub type Endpoint<'a> = &'a dyn Fn(&mut HandlerRequest) -> HandlerResult;

/// Continuation handed to every middleware.
pub struct Next<'a> {
    chain: &'a [Link<'a>],
    endpoint: Endpoint<'a>,
}

impl<'a> Next<'a> {
    #[must_use]
    pub fn new(chain: &'a [Link<'a>], endpoint: Endpoint<'a>) -> Self {
        Self { chain, endpoint }
    }

    /// Number of middleware still ahead of the endpoint.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }

    /// Run the rest of the chain.
    ///
    /// Once the request is stopped the remaining links and the endpoint are
    /// skipped and an empty 204 response is returned instead.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised by a downstream middleware or the
    /// endpoint.
    pub fn run(self, req: &mut HandlerRequest) -> HandlerResult {
        if req.is_stopped() {
            debug!(
                request_id = %req.request_id,
                skipped = self.chain.len(),
                "Chain stopped - skipping remaining stages"
            );
            return Ok(HandlerResponse::no_content());
        }

        match self.chain.split_first() {
            Some((link, rest)) => {
                debug!(
                    request_id = %req.request_id,
                    scope = %link.scope,
                    remaining = rest.len(),
                    "Middleware invoke"
                );
                link.middleware.invoke(req, Next::new(rest, self.endpoint))
            }
            None => (self.endpoint)(req),
        }
    }
}
