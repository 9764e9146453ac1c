use std::fmt;
use std::sync::Arc;

use http::Method;
use serde::Serialize;

use super::matcher::validate_pattern;
use crate::error::RegistrationError;
use crate::handler::{Stage, TerminalHandler};
use crate::ids::RouteId;
use crate::middleware::Middleware;

/// Methods a route answers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    Any,
    Only(Vec<Method>),
}

impl MethodFilter {
    #[must_use]
    pub fn allows(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(methods) => methods.contains(method),
        }
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodFilter::Any => f.write_str("ANY"),
            MethodFilter::Only(methods) => {
                let names: Vec<&str> = methods.iter().map(Method::as_str).collect();
                f.write_str(&names.join("|"))
            }
        }
    }
}

/// Bucket a route is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MethodKey {
    /// Method-agnostic bucket
    Any,
    Method(Method),
}

impl From<Option<Method>> for MethodKey {
    fn from(method: Option<Method>) -> Self {
        method.map_or(MethodKey::Any, MethodKey::Method)
    }
}

impl From<Method> for MethodKey {
    fn from(method: Method) -> Self {
        MethodKey::Method(method)
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodKey::Any => f.write_str("ANY"),
            MethodKey::Method(m) => f.write_str(m.as_str()),
        }
    }
}

/// A single registration: pattern, methods, middleware and terminal handler.
///
/// Everything but the middleware list is fixed once built.
#[derive(Clone)]
pub struct Route {
    id: RouteId,
    pattern: String,
    methods: MethodFilter,
    middlewares: Vec<Arc<dyn Middleware>>,
    handler: TerminalHandler,
}

impl Route {
    /// Build a route from its registration stages.
    ///
    /// The first N-1 stages must be middleware and the last one the terminal
    /// handler.
    ///
    /// # Errors
    ///
    /// [`RegistrationError`] for a malformed pattern, an empty stage list, a
    /// missing terminal handler or a terminal handler in a non-final position.
    pub fn new<I>(pattern: &str, methods: MethodFilter, stages: I) -> Result<Self, RegistrationError>
    where
        I: IntoIterator<Item = Stage>,
    {
        validate_pattern(pattern).map_err(|reason| RegistrationError::MalformedPattern {
            pattern: pattern.to_string(),
            reason,
        })?;

        let mut stages: Vec<Stage> = stages.into_iter().collect();
        let Some(last) = stages.last() else {
            return Err(RegistrationError::EmptyHandlers {
                pattern: pattern.to_string(),
            });
        };
        if !last.is_terminal() {
            return Err(RegistrationError::MissingTerminal {
                pattern: pattern.to_string(),
            });
        }
        let body = &stages[..stages.len() - 1];
        if let Some(position) = body.iter().position(Stage::is_terminal) {
            return Err(RegistrationError::MisplacedHandler {
                pattern: pattern.to_string(),
                position,
            });
        }

        let handler = match stages.pop() {
            Some(Stage::Handler(h)) => TerminalHandler::Callable(h),
            Some(Stage::Action(name)) => TerminalHandler::Action(name),
            Some(Stage::Middleware(_)) | None => {
                return Err(RegistrationError::MissingTerminal {
                    pattern: pattern.to_string(),
                })
            }
        };
        let middlewares = stages
            .into_iter()
            .filter_map(|stage| match stage {
                Stage::Middleware(mw) => Some(mw),
                Stage::Handler(_) | Stage::Action(_) => None,
            })
            .collect();

        Ok(Self {
            id: RouteId::next(),
            pattern: pattern.to_string(),
            methods,
            middlewares,
            handler,
        })
    }

    #[must_use]
    pub fn id(&self) -> RouteId {
        self.id
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn methods(&self) -> &MethodFilter {
        &self.methods
    }

    #[must_use]
    pub fn middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.middlewares
    }

    #[must_use]
    pub fn handler(&self) -> &TerminalHandler {
        &self.handler
    }

    /// Append a route-level middleware.
    pub fn add_middleware(&mut self, mw: impl Middleware + 'static) -> &mut Self {
        self.middlewares.push(Arc::new(mw));
        self
    }

    /// Independent copy under a fresh id and method filter.
    pub(crate) fn duplicate(&self, methods: MethodFilter) -> Self {
        Self {
            id: RouteId::next(),
            methods,
            ..self.clone()
        }
    }

    pub(crate) fn with_pattern(&self, pattern: String) -> Self {
        Self {
            pattern,
            ..self.clone()
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("pattern", &self.pattern)
            .field("methods", &self.methods)
            .field("middlewares", &self.middlewares.len())
            .field("handler", &self.handler)
            .finish()
    }
}

/// Serializable summary of a route, used by the route table.
#[derive(Debug, Clone, Serialize)]
pub struct RouteInfo {
    pub id: RouteId,
    pub method: String,
    pub pattern: String,
    pub handler: String,
    pub middlewares: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::HandlerResponse;

    fn handler() -> Stage {
        Stage::call(|_| Ok(HandlerResponse::default()))
    }

    fn passthrough() -> Stage {
        Stage::mw(|req, next| next.run(req))
    }

    #[test]
    fn last_stage_is_the_terminal() {
        let route = Route::new("/x", MethodFilter::Any, [passthrough(), passthrough(), handler()])
            .unwrap();
        assert_eq!(route.middlewares().len(), 2);
        assert!(matches!(route.handler(), TerminalHandler::Callable(_)));
    }

    #[test]
    fn rejects_structurally_invalid_stage_lists() {
        assert_eq!(
            Route::new("/x", MethodFilter::Any, Vec::<Stage>::new()).unwrap_err(),
            RegistrationError::EmptyHandlers { pattern: "/x".into() }
        );
        assert_eq!(
            Route::new("/x", MethodFilter::Any, [handler(), passthrough()]).unwrap_err(),
            RegistrationError::MissingTerminal { pattern: "/x".into() }
        );
        assert_eq!(
            Route::new("/x", MethodFilter::Any, [Stage::action("a"), handler()]).unwrap_err(),
            RegistrationError::MisplacedHandler { pattern: "/x".into(), position: 0 }
        );
    }

    #[test]
    fn duplicates_get_fresh_ids_and_own_middleware() {
        let original = Route::new("/x", MethodFilter::Any, [handler()]).unwrap();
        let mut copy = original.duplicate(MethodFilter::Only(vec![Method::POST]));
        assert_ne!(original.id(), copy.id());
        copy.add_middleware(crate::middleware::from_fn(|req, next| next.run(req)));
        assert_eq!(copy.middlewares().len(), 1);
        assert!(original.middlewares().is_empty());
    }

    #[test]
    fn method_filter_display() {
        let only = MethodFilter::Only(vec![Method::GET, Method::POST]);
        assert_eq!(only.to_string(), "GET|POST");
        assert!(only.allows(&Method::POST));
        assert!(!only.allows(&Method::PUT));
        assert!(MethodFilter::Any.allows(&Method::DELETE));
    }
}
