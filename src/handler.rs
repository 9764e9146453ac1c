//! Terminal handlers, controllers and route stages.
//!
//! A route is registered as an ordered list of [`Stage`]s: every stage but the
//! last is middleware, the last one is the terminal handler. A terminal is
//! either a callable ([`Handler`]) or the name of an action on the
//! collection's main handler ([`Controller`]).

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::container::ControllerResolver;
use crate::dispatcher::{HandlerRequest, HandlerResult};
use crate::error::{DispatchError, ResolveError};
use crate::middleware::{FnMiddleware, Middleware};

/// Terminal stage of a route.
pub trait Handler: Send + Sync {
    /// # Errors
    ///
    /// Errors are routed to the application's error handler.
    fn call(&self, req: &mut HandlerRequest) -> HandlerResult;
}

/// Adapter turning a closure into a [`Handler`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut HandlerRequest) -> HandlerResult + Send + Sync,
{
    fn call(&self, req: &mut HandlerRequest) -> HandlerResult {
        (self.f)(req)
    }
}

/// Wrap a closure as a terminal handler.
pub fn from_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&mut HandlerRequest) -> HandlerResult + Send + Sync,
{
    FnHandler { f }
}

/// Produces the response when a stage failed.
pub trait ErrorHandler: Send + Sync {
    /// # Errors
    ///
    /// A failing error handler surfaces as [`DispatchError::ErrorHandler`].
    fn handle(&self, req: &mut HandlerRequest, err: &DispatchError) -> HandlerResult;
}

impl<F> ErrorHandler for F
where
    F: Fn(&mut HandlerRequest, &DispatchError) -> HandlerResult + Send + Sync,
{
    fn handle(&self, req: &mut HandlerRequest, err: &DispatchError) -> HandlerResult {
        self(req, err)
    }
}

/// Main handler of a collection: a set of named actions.
pub trait Controller: Send + Sync {
    /// Run `action`, or return `None` when the controller does not have it.
    fn call_action(&self, action: &str, req: &mut HandlerRequest) -> Option<HandlerResult>;
}

type ControllerFactory = dyn Fn() -> anyhow::Result<Arc<dyn Controller>> + Send + Sync;

/// How a collection obtains its main handler.
#[derive(Clone)]
pub enum MainHandler {
    /// A ready instance.
    Instance(Arc<dyn Controller>),
    /// A constructor, invoked once.
    Factory(Arc<ControllerFactory>),
    /// A service id looked up through the application's resolver.
    Service(String),
}

impl MainHandler {
    pub fn instance(controller: impl Controller + 'static) -> Self {
        MainHandler::Instance(Arc::new(controller))
    }

    pub fn factory<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn Controller>> + Send + Sync + 'static,
    {
        MainHandler::Factory(Arc::new(f))
    }

    pub fn service(id: impl Into<String>) -> Self {
        MainHandler::Service(id.into())
    }

    fn describe(&self) -> &str {
        match self {
            MainHandler::Instance(_) => "instance",
            MainHandler::Factory(_) => "factory",
            MainHandler::Service(id) => id,
        }
    }
}

impl fmt::Debug for MainHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MainHandler::Instance(_) => f.write_str("MainHandler::Instance"),
            MainHandler::Factory(_) => f.write_str("MainHandler::Factory"),
            MainHandler::Service(id) => write!(f, "MainHandler::Service({id})"),
        }
    }
}

/// A collection's main handler together with its resolved instance.
///
/// The collection owns the slot and every unit it mounts shares it, so a
/// controller is built at most once no matter how many of its routes are hit
/// first, how many threads race on the first request or how often the
/// collection is remounted.
pub struct ControllerSlot {
    source: MainHandler,
    cell: OnceCell<Arc<dyn Controller>>,
}

impl ControllerSlot {
    #[must_use]
    pub fn new(source: MainHandler) -> Self {
        let cell = OnceCell::new();
        if let MainHandler::Instance(controller) = &source {
            let _ = cell.set(Arc::clone(controller));
        }
        Self { source, cell }
    }

    #[must_use]
    pub fn source(&self) -> &MainHandler {
        &self.source
    }

    /// Whether the controller was already instantiated.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Return the controller, instantiating it on first use.
    ///
    /// # Errors
    ///
    /// Fails when the service id is unknown or the factory errors. A failed
    /// attempt is not cached, so the next call tries again.
    pub fn resolve(
        &self,
        resolver: &dyn ControllerResolver,
    ) -> Result<Arc<dyn Controller>, ResolveError> {
        self.cell
            .get_or_try_init(|| {
                debug!(main_handler = self.source.describe(), "Instantiating main handler");
                match &self.source {
                    MainHandler::Instance(controller) => Ok(Arc::clone(controller)),
                    MainHandler::Factory(factory) => {
                        factory().map_err(|source| ResolveError::Factory {
                            id: "factory".to_string(),
                            source,
                        })
                    }
                    MainHandler::Service(id) => resolver.resolve(id),
                }
            })
            .map(Arc::clone)
    }
}

impl fmt::Debug for ControllerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerSlot")
            .field("source", &self.source)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Terminal handler of a route.
#[derive(Clone)]
pub enum TerminalHandler {
    Callable(Arc<dyn Handler>),
    /// Name of an action on the collection's main handler
    Action(String),
}

impl fmt::Debug for TerminalHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalHandler::Callable(_) => f.write_str("Callable"),
            TerminalHandler::Action(name) => write!(f, "Action({name})"),
        }
    }
}

impl fmt::Display for TerminalHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalHandler::Callable(_) => f.write_str("<callable>"),
            TerminalHandler::Action(name) => write!(f, "#{name}"),
        }
    }
}

/// One registration stage.
///
/// Strings convert into [`Stage::Action`], so an action route can be written
/// as `coll.get("/", ["index".into()])`.
#[derive(Clone)]
pub enum Stage {
    Middleware(Arc<dyn Middleware>),
    Handler(Arc<dyn Handler>),
    Action(String),
}

impl Stage {
    pub fn middleware(mw: impl Middleware + 'static) -> Self {
        Stage::Middleware(Arc::new(mw))
    }

    pub fn handler(h: impl Handler + 'static) -> Self {
        Stage::Handler(Arc::new(h))
    }

    /// Closure shorthand for [`Stage::middleware`].
    pub fn mw<F>(f: F) -> Self
    where
        F: Fn(&mut HandlerRequest, crate::dispatcher::Next<'_>) -> HandlerResult
            + Send
            + Sync
            + 'static,
    {
        Stage::Middleware(Arc::new(crate::middleware::from_fn(f)))
    }

    /// Closure shorthand for [`Stage::handler`].
    pub fn call<F>(f: F) -> Self
    where
        F: Fn(&mut HandlerRequest) -> HandlerResult + Send + Sync + 'static,
    {
        Stage::Handler(Arc::new(from_fn(f)))
    }

    pub fn action(name: impl Into<String>) -> Self {
        Stage::Action(name.into())
    }

    pub(crate) fn is_terminal(&self) -> bool {
        !matches!(self, Stage::Middleware(_))
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Middleware(_) => f.write_str("Stage::Middleware"),
            Stage::Handler(_) => f.write_str("Stage::Handler"),
            Stage::Action(name) => write!(f, "Stage::Action({name})"),
        }
    }
}

impl From<&str> for Stage {
    fn from(name: &str) -> Self {
        Stage::Action(name.to_string())
    }
}

impl From<String> for Stage {
    fn from(name: String) -> Self {
        Stage::Action(name)
    }
}

impl<F> From<FnMiddleware<F>> for Stage
where
    FnMiddleware<F>: Middleware + 'static,
{
    fn from(mw: FnMiddleware<F>) -> Self {
        Stage::Middleware(Arc::new(mw))
    }
}

impl<F> From<FnHandler<F>> for Stage
where
    FnHandler<F>: Handler + 'static,
{
    fn from(h: FnHandler<F>) -> Self {
        Stage::Handler(Arc::new(h))
    }
}

impl From<Arc<dyn Middleware>> for Stage {
    fn from(mw: Arc<dyn Middleware>) -> Self {
        Stage::Middleware(mw)
    }
}

impl From<Arc<dyn Handler>> for Stage {
    fn from(h: Arc<dyn Handler>) -> Self {
        Stage::Handler(h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use crate::dispatcher::HandlerResponse;
    use http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo;

    impl Controller for Echo {
        fn call_action(&self, action: &str, _req: &mut HandlerRequest) -> Option<HandlerResult> {
            (action == "index").then(|| Ok(HandlerResponse::from("index")))
        }
    }

    #[test]
    fn factory_slot_instantiates_once() {
        static BUILT: AtomicUsize = AtomicUsize::new(0);
        let slot = ControllerSlot::new(MainHandler::factory(|| {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Echo) as Arc<dyn Controller>)
        }));
        let container = Container::new();
        assert!(!slot.is_resolved());
        slot.resolve(&container).unwrap();
        slot.resolve(&container).unwrap();
        assert!(slot.is_resolved());
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn instance_slot_is_resolved_up_front() {
        let slot = ControllerSlot::new(MainHandler::instance(Echo));
        assert!(slot.is_resolved());
        let mut req = HandlerRequest::new(Method::GET, "/");
        let controller = slot.resolve(&Container::new()).unwrap();
        assert!(controller.call_action("index", &mut req).is_some());
        assert!(controller.call_action("missing", &mut req).is_none());
    }

    #[test]
    fn failed_resolution_is_retried() {
        let slot = ControllerSlot::new(MainHandler::service("users"));
        let container = Container::new();
        assert!(matches!(
            slot.resolve(&container),
            Err(ResolveError::NotRegistered { .. })
        ));
        container.set_instance("users", Arc::new(Echo));
        assert!(slot.resolve(&container).is_ok());
    }

    #[test]
    fn strings_become_actions() {
        assert!(matches!(Stage::from("show"), Stage::Action(ref a) if a == "show"));
        assert!(Stage::call(|_| Ok(HandlerResponse::default())).is_terminal());
        assert!(!Stage::mw(|req, next| next.run(req)).is_terminal());
    }
}
