//! Router core module - the flattened, method-indexed registry and route
//! resolution.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Method;
use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use super::matcher::CompiledPattern;
use super::route::{MethodKey, Route, RouteInfo};
use crate::handler::ControllerSlot;
use crate::ids::{CollectionId, RouteId};
use crate::middleware::Middleware;

/// Maximum number of path/query parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage.
///
/// Param names use `Arc<str>`: they come from the compiled patterns (known at
/// mount time) and `Arc::clone()` is an atomic increment instead of a string
/// copy. Values remain `String` as they're per-request data from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

const SLOW_MATCH: Duration = Duration::from_millis(1);

/// The collection a unit was mounted from.
#[derive(Debug, Clone)]
pub struct Origin {
    pub id: CollectionId,
    pub name: Option<String>,
}

/// A route flattened at mount time together with its collection context.
pub struct DispatchUnit {
    key: MethodKey,
    route: Route,
    origin: Option<Origin>,
    group_middlewares: Arc<[Arc<dyn Middleware>]>,
    slot: Option<Arc<ControllerSlot>>,
    compiled: Box<dyn CompiledPattern>,
}

impl DispatchUnit {
    /// `route` must already carry its fully-qualified pattern.
    pub(crate) fn new(
        key: MethodKey,
        route: Route,
        origin: Option<Origin>,
        group_middlewares: Arc<[Arc<dyn Middleware>]>,
        slot: Option<Arc<ControllerSlot>>,
        compiled: Box<dyn CompiledPattern>,
    ) -> Self {
        Self {
            key,
            route,
            origin,
            group_middlewares,
            slot,
            compiled,
        }
    }

    #[must_use]
    pub fn key(&self) -> &MethodKey {
        &self.key
    }

    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Fully-qualified pattern (prefix included)
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.route.pattern()
    }

    /// Name of the owning collection, if it has one.
    #[must_use]
    pub fn collection(&self) -> Option<&str> {
        self.origin.as_ref()?.name.as_deref()
    }

    #[must_use]
    pub fn collection_id(&self) -> Option<CollectionId> {
        self.origin.as_ref().map(|o| o.id)
    }

    #[must_use]
    pub fn group_middlewares(&self) -> &[Arc<dyn Middleware>] {
        &self.group_middlewares
    }

    /// The owning collection's main handler, shared by all its units.
    #[must_use]
    pub fn slot(&self) -> Option<&Arc<ControllerSlot>> {
        self.slot.as_ref()
    }

    #[must_use]
    pub fn info(&self) -> RouteInfo {
        RouteInfo {
            id: self.route.id(),
            method: self.key.to_string(),
            pattern: self.pattern().to_string(),
            handler: self.route.handler().to_string(),
            middlewares: self.group_middlewares.len() + self.route.middlewares().len(),
        }
    }
}

impl fmt::Debug for DispatchUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchUnit")
            .field("key", &self.key)
            .field("route", &self.route)
            .field("origin", &self.origin)
            .field("group_middlewares", &self.group_middlewares.len())
            .field("compiled", &self.compiled)
            .finish()
    }
}

/// Result of successfully resolving a request path
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub unit: Arc<DispatchUnit>,
    /// Path parameters extracted from the URL (e.g., `{id}` → `("id", "123")`)
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name ("last write wins")
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

type Bucket = IndexMap<String, Arc<DispatchUnit>>;

/// Method-indexed store of dispatch units keyed by fully-qualified pattern.
#[derive(Debug, Default)]
pub struct Registry {
    buckets: IndexMap<MethodKey, Bucket>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a unit, replacing (in place) any unit with the same bucket and
    /// pattern. Returns the replaced unit.
    pub fn insert(&mut self, unit: DispatchUnit) -> Option<Arc<DispatchUnit>> {
        let bucket = self.buckets.entry(unit.key.clone()).or_default();
        bucket.insert(unit.pattern().to_string(), Arc::new(unit))
    }

    #[must_use]
    pub fn get(&self, key: &MethodKey, pattern: &str) -> Option<&Arc<DispatchUnit>> {
        self.buckets.get(key)?.get(pattern)
    }

    /// Remove the unit built from route `id`, keeping the order of the rest.
    pub fn remove(&mut self, id: RouteId) -> Option<Arc<DispatchUnit>> {
        self.buckets.values_mut().find_map(|bucket| {
            let index = bucket.values().position(|u| u.route.id() == id)?;
            bucket.shift_remove_index(index).map(|(_, unit)| unit)
        })
    }

    /// Drop every unit `keep` rejects, preserving the order of the rest.
    /// Returns how many were dropped.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&DispatchUnit) -> bool,
    {
        let before = self.len();
        for bucket in self.buckets.values_mut() {
            bucket.retain(|_, unit| keep(&**unit));
        }
        before - self.len()
    }

    /// All units, bucket by bucket, registration order within each bucket.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<DispatchUnit>> {
        self.buckets.values().flat_map(IndexMap::values)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.values().map(IndexMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a request.
    ///
    /// The method's own bucket is searched first, then the method-agnostic
    /// one. Within a bucket the first-registered matching pattern wins, even
    /// when a later static pattern spells out the path exactly.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let match_start = Instant::now();
        let result = self
            .resolve_in(&MethodKey::Method(method.clone()), path)
            .or_else(|| self.resolve_in(&MethodKey::Any, path));
        let duration = match_start.elapsed();

        match &result {
            Some(m) if duration > SLOW_MATCH => warn!(
                method = %method,
                path = %path,
                route_pattern = %m.unit.pattern(),
                duration_us = duration.as_micros(),
                "Slow route matching detected"
            ),
            Some(m) => debug!(
                method = %method,
                path = %path,
                route_pattern = %m.unit.pattern(),
                route_id = %m.unit.route.id(),
                path_params = ?m.path_params,
                duration_us = duration.as_micros(),
                "Route matched"
            ),
            None => debug!(
                method = %method,
                path = %path,
                duration_us = duration.as_micros(),
                "No route matched"
            ),
        }
        result
    }

    fn resolve_in(&self, key: &MethodKey, path: &str) -> Option<RouteMatch> {
        self.buckets.get(key)?.values().find_map(|unit| {
            unit.compiled.captures(path).map(|path_params| RouteMatch {
                unit: Arc::clone(unit),
                path_params,
            })
        })
    }

    /// Serializable summary of every unit.
    #[must_use]
    pub fn route_table(&self) -> Vec<RouteInfo> {
        self.iter().map(|u| u.info()).collect()
    }

    /// One human-readable line per unit.
    #[must_use]
    pub fn route_lines(&self) -> Vec<String> {
        self.iter()
            .map(|u| {
                format!(
                    "{:<7} {:<32} -> {} [{}{}]",
                    u.key.to_string(),
                    u.pattern(),
                    u.route.handler(),
                    u.route.id(),
                    u.collection()
                        .map(|c| format!(", {c}"))
                        .unwrap_or_default()
                )
            })
            .collect()
    }
}
