//! Error types for the setup phase (registration, mount, configuration)
//! and the request phase (dispatch).
//!
//! Setup errors are fatal to the call that raised them and never leave a
//! collection or the registry half-updated. Dispatch errors are recoverable
//! through the application's error handler.

use std::fmt;
use std::path::PathBuf;

fn anyhow_source(err: &anyhow::Error) -> &(dyn std::error::Error + 'static) {
    &**err
}

/// Structurally invalid route registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// No middleware and no terminal handler were supplied.
    EmptyHandlers {
        /// Pattern the registration was attempted for
        pattern: String,
    },
    /// The final stage is a middleware, so the route has no terminal handler.
    MissingTerminal { pattern: String },
    /// A terminal handler appeared before the final position.
    MisplacedHandler {
        pattern: String,
        /// Zero-based position of the offending stage
        position: usize,
    },
    /// The pattern is not a valid route template.
    MalformedPattern { pattern: String, reason: String },
    /// `map_via` was called with an empty method list.
    NoMethods { pattern: String },
    /// An application-level route named an action; only collections have a
    /// main handler to run actions against.
    ActionWithoutController { pattern: String, action: String },
    /// Routes cannot be registered once the application has dispatched.
    AfterDispatch,
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::EmptyHandlers { pattern } => {
                write!(f, "route '{pattern}' was registered without any handlers")
            }
            RegistrationError::MissingTerminal { pattern } => write!(
                f,
                "route '{pattern}' has no terminal handler: the last stage must be a handler or an action name"
            ),
            RegistrationError::MisplacedHandler { pattern, position } => write!(
                f,
                "route '{pattern}': stage {position} is a terminal handler but only the last stage may be one"
            ),
            RegistrationError::MalformedPattern { pattern, reason } => {
                write!(f, "malformed route pattern '{pattern}': {reason}")
            }
            RegistrationError::NoMethods { pattern } => {
                write!(f, "route '{pattern}' was mapped via an empty method list")
            }
            RegistrationError::ActionWithoutController { pattern, action } => write!(
                f,
                "route '{pattern}' names action '{action}' but application-level routes have no main handler"
            ),
            RegistrationError::AfterDispatch => write!(
                f,
                "routes cannot be registered after the application started dispatching"
            ),
        }
    }
}

impl std::error::Error for RegistrationError {}

/// Failure to look up or build a controller.
#[derive(Debug)]
pub enum ResolveError {
    /// No service is registered under the requested id.
    NotRegistered { id: String },
    /// The service factory failed.
    Factory { id: String, source: anyhow::Error },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NotRegistered { id } => {
                write!(f, "no controller is registered under '{id}'")
            }
            ResolveError::Factory { id, source } => {
                write!(f, "controller '{id}' could not be instantiated: {source}")
            }
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Factory { source, .. } => Some(anyhow_source(source)),
            ResolveError::NotRegistered { .. } => None,
        }
    }
}

/// Failure to mount a collection into the application.
#[derive(Debug)]
pub enum MountError {
    /// The collection holds no routes.
    EmptyCollection { prefix: String },
    /// A route names an action but the collection has no main handler.
    MissingMainHandler { pattern: String },
    /// The path matcher rejected a fully-qualified pattern.
    InvalidPattern { pattern: String, reason: String },
    /// Eager main handler resolution failed.
    Resolve(ResolveError),
    /// Application hooks and collections are fixed once dispatching started.
    AfterDispatch,
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountError::EmptyCollection { prefix } => {
                write!(f, "collection '{prefix}' has no routes to mount")
            }
            MountError::MissingMainHandler { pattern } => write!(
                f,
                "route '{pattern}' names an action but its collection has no main handler"
            ),
            MountError::InvalidPattern { pattern, reason } => {
                write!(f, "pattern '{pattern}' could not be compiled: {reason}")
            }
            MountError::Resolve(err) => write!(f, "main handler resolution failed: {err}"),
            MountError::AfterDispatch => write!(
                f,
                "the application cannot be modified after it started dispatching"
            ),
        }
    }
}

impl std::error::Error for MountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MountError::Resolve(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResolveError> for MountError {
    fn from(err: ResolveError) -> Self {
        MountError::Resolve(err)
    }
}

/// Failure raised while a request is being dispatched.
#[derive(Debug)]
pub enum DispatchError {
    /// A middleware or handler returned an error.
    Handler(anyhow::Error),
    /// The main handler does not know the requested action.
    UnknownAction { action: String },
    /// An action route has no main handler to run against.
    MissingMainHandler { pattern: String },
    /// Lazy main handler resolution failed.
    Resolve(ResolveError),
    /// A middleware or handler panicked.
    Panicked { message: String },
    /// The error handler itself failed while recovering from `original`.
    ErrorHandler {
        original: Box<DispatchError>,
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// Convert a chain error back into a typed dispatch error.
    ///
    /// Typed errors raised inside the chain travel as `anyhow::Error`; they are
    /// recovered here so the error handler sees the original variant.
    #[must_use]
    pub fn from_chain(err: anyhow::Error) -> Self {
        match err.downcast::<DispatchError>() {
            Ok(typed) => typed,
            Err(err) => match err.downcast::<ResolveError>() {
                Ok(resolve) => DispatchError::Resolve(resolve),
                Err(err) => DispatchError::Handler(err),
            },
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Handler(err) => write!(f, "handler failed: {err}"),
            DispatchError::UnknownAction { action } => {
                write!(f, "main handler has no action '{action}'")
            }
            DispatchError::MissingMainHandler { pattern } => {
                write!(f, "route '{pattern}' has no main handler")
            }
            DispatchError::Resolve(err) => write!(f, "{err}"),
            DispatchError::Panicked { message } => write!(f, "handler panicked: {message}"),
            DispatchError::ErrorHandler { original, source } => {
                write!(f, "error handler failed ({source}) while handling: {original}")
            }
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Handler(err) => Some(anyhow_source(err)),
            DispatchError::Resolve(err) => Some(err),
            DispatchError::ErrorHandler { source, .. } => Some(anyhow_source(source)),
            _ => None,
        }
    }
}

impl From<ResolveError> for DispatchError {
    fn from(err: ResolveError) -> Self {
        DispatchError::Resolve(err)
    }
}

/// Invalid or unreadable configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The dotenv file could not be parsed.
    Dotenv { path: PathBuf, message: String },
    Toml(toml::de::Error),
    /// A key carried a value of the wrong shape.
    InvalidValue { key: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "could not read '{}': {source}", path.display())
            }
            ConfigError::Dotenv { path, message } => {
                write!(f, "could not parse dotenv file '{}': {message}", path.display())
            }
            ConfigError::Toml(err) => write!(f, "invalid TOML configuration: {err}"),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "invalid value '{value}' for {key}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err)
    }
}
