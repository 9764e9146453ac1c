use std::fmt;

use crate::dispatcher::{HandlerRequest, HandlerResult, Next};

/// A stage wrapped around the terminal handler.
///
/// Code before `next.run(req)` is the pre-phase, code after it the
/// post-phase. Returning without calling `next` short-circuits everything
/// downstream; pair it with [`HandlerRequest::stop`] to also skip the
/// application's after stage.
pub trait Middleware: Send + Sync {
    /// # Errors
    ///
    /// Any error aborts the chain and is routed to the application's error
    /// handler.
    fn invoke(&self, req: &mut HandlerRequest, next: Next<'_>) -> HandlerResult;
}

/// Adapter turning a closure into a [`Middleware`].
pub struct FnMiddleware<F> {
    f: F,
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut HandlerRequest, Next<'_>) -> HandlerResult + Send + Sync,
{
    fn invoke(&self, req: &mut HandlerRequest, next: Next<'_>) -> HandlerResult {
        (self.f)(req, next)
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnMiddleware")
    }
}

/// Wrap a closure as middleware.
///
/// ```rust
/// use stackroute::middleware::from_fn;
///
/// let mw = from_fn(|req, next| {
///     req.headers.push(("x-seen".into(), "1".to_string()));
///     next.run(req)
/// });
/// # let _ = mw;
/// ```
pub fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: Fn(&mut HandlerRequest, Next<'_>) -> HandlerResult + Send + Sync,
{
    FnMiddleware { f }
}
