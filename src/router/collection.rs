//! Route groups.
//!
//! A [`Collection`] holds routes sharing a prefix, a main handler and group
//! middleware. Nothing is matchable until the collection is mounted into an
//! [`Application`](crate::app::Application), which flattens it into the
//! registry.

use std::fmt;
use std::sync::Arc;

use http::Method;
use indexmap::IndexMap;
use tracing::warn;

use super::route::{MethodFilter, MethodKey, Route};
use crate::error::RegistrationError;
use crate::handler::{ControllerSlot, MainHandler, Stage};
use crate::ids::CollectionId;
use crate::middleware::Middleware;

type Bucket = IndexMap<String, Route>;

/// A named group of routes.
///
/// The main handler lives in a slot owned by the collection, so its instance
/// is built at most once for the collection's lifetime, however often the
/// collection is mounted.
pub struct Collection {
    id: CollectionId,
    name: Option<String>,
    prefix: String,
    slot: Option<Arc<ControllerSlot>>,
    lazy: bool,
    middlewares: Vec<Arc<dyn Middleware>>,
    routes: IndexMap<MethodKey, Bucket>,
}

macro_rules! method_shortcut {
    ($($(#[$doc:meta])* $fn_name:ident => $method:expr;)+) => {
        $(
            $(#[$doc])*
            ///
            /// # Errors
            ///
            /// See [`Collection::add_map`].
            pub fn $fn_name<I>(&mut self, pattern: &str, stages: I) -> Result<&mut Route, RegistrationError>
            where
                I: IntoIterator<Item = Stage>,
            {
                self.add_map(Some($method), pattern, stages)
            }
        )+
    };
}

impl Default for Collection {
    fn default() -> Self {
        Self {
            id: CollectionId::next(),
            name: None,
            prefix: String::new(),
            slot: None,
            lazy: false,
            middlewares: Vec::new(),
            routes: IndexMap::new(),
        }
    }
}

impl Collection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A collection whose name shows up in logs and the route table.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    method_shortcut! {
        /// Register a `GET` route.
        get => Method::GET;
        /// Register a `POST` route.
        post => Method::POST;
        /// Register a `PUT` route.
        put => Method::PUT;
        /// Register a `PATCH` route.
        patch => Method::PATCH;
        /// Register a `DELETE` route.
        delete => Method::DELETE;
        /// Register a `HEAD` route.
        head => Method::HEAD;
        /// Register an `OPTIONS` route.
        options => Method::OPTIONS;
    }

    /// Register a route answering to every method.
    ///
    /// # Errors
    ///
    /// See [`Collection::add_map`].
    pub fn map<I>(&mut self, pattern: &str, stages: I) -> Result<&mut Route, RegistrationError>
    where
        I: IntoIterator<Item = Stage>,
    {
        self.add_map(None, pattern, stages)
    }

    /// Register one independent route per method.
    ///
    /// Every route starts with the same middleware and terminal handler but
    /// owns its own middleware list and id.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::NoMethods`] for an empty method list, otherwise
    /// see [`Collection::add_map`]. Nothing is inserted on error.
    pub fn map_via<I>(
        &mut self,
        pattern: &str,
        methods: &[Method],
        stages: I,
    ) -> Result<&mut Self, RegistrationError>
    where
        I: IntoIterator<Item = Stage>,
    {
        if methods.is_empty() {
            return Err(RegistrationError::NoMethods {
                pattern: pattern.to_string(),
            });
        }
        let template = Route::new(pattern, MethodFilter::Any, stages)?;
        for method in methods {
            let route = template.duplicate(MethodFilter::Only(vec![method.clone()]));
            self.insert(MethodKey::Method(method.clone()), route);
        }
        Ok(self)
    }

    /// Insert-or-replace a route.
    ///
    /// `None` stores the route in the method-agnostic bucket, otherwise the
    /// per-method bucket is created on demand. A route already registered
    /// under the same (bucket, pattern) is replaced in place, keeping its
    /// position in the registration order.
    ///
    /// # Errors
    ///
    /// [`RegistrationError`] when the pattern is malformed or the stages do
    /// not end in exactly one terminal handler. The collection is left
    /// unchanged.
    pub fn add_map<I>(
        &mut self,
        method: Option<Method>,
        pattern: &str,
        stages: I,
    ) -> Result<&mut Route, RegistrationError>
    where
        I: IntoIterator<Item = Stage>,
    {
        let filter = method
            .clone()
            .map_or(MethodFilter::Any, |m| MethodFilter::Only(vec![m]));
        let route = Route::new(pattern, filter, stages)?;
        Ok(self.insert(MethodKey::from(method), route))
    }

    fn insert(&mut self, key: MethodKey, route: Route) -> &mut Route {
        let bucket = self.routes.entry(key.clone()).or_default();
        let pattern = route.pattern().to_string();
        let new_id = route.id();
        let (index, previous) = bucket.insert_full(pattern, route);
        if let Some(previous) = previous {
            warn!(
                collection = self.name.as_deref().unwrap_or("-"),
                method = %key,
                pattern = %previous.pattern(),
                replaced_route = %previous.id(),
                route_id = %new_id,
                "Route re-registered - replacing previous registration"
            );
        }
        &mut bucket[index]
    }

    /// Replace the main handler. A previously built instance is discarded.
    pub fn set_handler(&mut self, handler: MainHandler) -> &mut Self {
        self.slot = Some(Arc::new(ControllerSlot::new(handler)));
        self
    }

    pub fn set_lazy(&mut self, lazy: bool) -> &mut Self {
        self.lazy = lazy;
        self
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.prefix = prefix.into();
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Append a group middleware, run outside every route's own middleware.
    pub fn add_middleware(&mut self, mw: impl Middleware + 'static) -> &mut Self {
        self.middlewares.push(Arc::new(mw));
        self
    }

    #[must_use]
    pub fn id(&self) -> CollectionId {
        self.id
    }

    #[must_use]
    pub fn handler(&self) -> Option<&MainHandler> {
        self.slot.as_deref().map(ControllerSlot::source)
    }

    pub(crate) fn slot(&self) -> Option<&Arc<ControllerSlot>> {
        self.slot.as_ref()
    }

    #[must_use]
    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.middlewares
    }

    #[must_use]
    pub fn route(&self, key: &MethodKey, pattern: &str) -> Option<&Route> {
        self.routes.get(key)?.get(pattern)
    }

    pub fn route_mut(&mut self, key: &MethodKey, pattern: &str) -> Option<&mut Route> {
        self.routes.get_mut(key)?.get_mut(pattern)
    }

    /// Routes of one bucket, in registration order.
    pub fn bucket(&self, key: &MethodKey) -> impl Iterator<Item = &Route> {
        self.routes.get(key).into_iter().flat_map(IndexMap::values)
    }

    /// All routes with their bucket, bucket by bucket in the order buckets
    /// were created, registration order within each bucket.
    pub fn routes(&self) -> impl Iterator<Item = (&MethodKey, &Route)> {
        self.routes
            .iter()
            .flat_map(|(key, bucket)| bucket.values().map(move |route| (key, route)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.values().map(IndexMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every route, keeping prefix, handler and group middleware.
    pub fn clear(&mut self) {
        self.routes.clear();
    }

    /// Fully-qualified pattern of a route in this collection.
    ///
    /// A `/` route under a non-empty prefix maps to the prefix itself, so
    /// `/users` + `/` is `/users` rather than `/users/`.
    #[must_use]
    pub fn full_pattern(&self, pattern: &str) -> String {
        if self.prefix.is_empty() {
            return pattern.to_string();
        }
        if pattern == "/" || pattern.is_empty() {
            return self.prefix.clone();
        }
        format!("{}{}", self.prefix, pattern)
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("handler", &self.slot)
            .field("lazy", &self.lazy)
            .field("middlewares", &self.middlewares.len())
            .field("routes", &self.len())
            .finish()
    }
}
