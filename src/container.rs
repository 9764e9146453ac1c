//! Keyed controller lookup.
//!
//! The application never builds controllers itself: a collection whose main
//! handler is a service id asks a [`ControllerResolver`]. [`Container`] is
//! the default resolver.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::ResolveError;
use crate::handler::Controller;

/// Looks up controllers by service id.
pub trait ControllerResolver: Send + Sync {
    /// # Errors
    ///
    /// [`ResolveError::NotRegistered`] for unknown ids,
    /// [`ResolveError::Factory`] when construction fails.
    fn resolve(&self, id: &str) -> Result<Arc<dyn Controller>, ResolveError>;
}

type Factory = Arc<dyn Fn() -> anyhow::Result<Arc<dyn Controller>> + Send + Sync>;

/// Lifetime of a registered service.
#[derive(Clone)]
enum Service {
    /// Built on every lookup.
    Transient(Factory),
    /// Built on first lookup, then reused.
    Shared(Factory, Arc<OnceCell<Arc<dyn Controller>>>),
    /// Registered ready-made.
    Instance(Arc<dyn Controller>),
}

impl Service {
    fn kind(&self) -> &'static str {
        match self {
            Service::Transient(_) => "transient",
            Service::Shared(..) => "shared",
            Service::Instance(_) => "instance",
        }
    }
}

/// Thread-safe service container.
#[derive(Default)]
pub struct Container {
    services: DashMap<String, Service>,
}

impl Container {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory invoked on every lookup.
    pub fn set<F>(&self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> anyhow::Result<Arc<dyn Controller>> + Send + Sync + 'static,
    {
        self.insert(id.into(), Service::Transient(Arc::new(factory)));
    }

    /// Register a factory invoked once; later lookups reuse its result.
    pub fn set_shared<F>(&self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> anyhow::Result<Arc<dyn Controller>> + Send + Sync + 'static,
    {
        self.insert(
            id.into(),
            Service::Shared(Arc::new(factory), Arc::new(OnceCell::new())),
        );
    }

    /// Register a ready instance.
    pub fn set_instance(&self, id: impl Into<String>, controller: Arc<dyn Controller>) {
        self.insert(id.into(), Service::Instance(controller));
    }

    fn insert(&self, id: String, service: Service) {
        debug!(service_id = %id, kind = service.kind(), "Registering service");
        self.services.insert(id, service);
    }

    /// # Errors
    ///
    /// See [`ControllerResolver::resolve`].
    pub fn get(&self, id: &str) -> Result<Arc<dyn Controller>, ResolveError> {
        // Clone out of the map so a factory may call back into the container.
        let service = self
            .services
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ResolveError::NotRegistered { id: id.to_string() })?;

        let build = |factory: &Factory| {
            factory().map_err(|source| ResolveError::Factory {
                id: id.to_string(),
                source,
            })
        };
        match service {
            Service::Instance(controller) => Ok(controller),
            Service::Transient(factory) => build(&factory),
            Service::Shared(factory, cell) => cell.get_or_try_init(|| build(&factory)).cloned(),
        }
    }

    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.services.contains_key(id)
    }

    /// Remove a service; returns whether it was registered.
    pub fn remove(&self, id: &str) -> bool {
        self.services.remove(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ControllerResolver for Container {
    fn resolve(&self, id: &str) -> Result<Arc<dyn Controller>, ResolveError> {
        self.get(id)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<String> = self.services.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        f.debug_struct("Container").field("services", &ids).finish()
    }
}
