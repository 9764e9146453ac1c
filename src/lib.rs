//! # stackroute
//!
//! **stackroute** is a route-collection and middleware-dispatch engine. An
//! [`Application`](app::Application) owns ordered stage lists and a registry of
//! routes; every request travels through the same onion of stages.
//!
//! ## Architecture
//!
//! - **[`router`]** - routes, collections, the flattened registry and path matching
//! - **[`dispatcher`]** - request/response types and the consume-once middleware chain
//! - **[`middleware`]** - the [`Middleware`](middleware::Middleware) trait plus
//!   tracing, metrics, auth and envelope middleware
//! - **[`handler`]** - terminal handlers, controllers and route stages
//! - **[`container`]** - the service container lazy controllers resolve through
//! - **[`app`]** - mounting and per-request dispatch
//! - **[`runtime_config`]** - TOML/dotenv/environment configuration
//! - **[`logging`]** - `tracing-subscriber` setup
//! - **[`cli`]** - the `stackroute` binary's commands
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant App as Application
//!     participant Reg as Registry
//!     participant Chain as Next (onion)
//!     participant Term as Terminal
//!
//!     Caller->>App: handle(req)
//!     App->>Reg: resolve(method, path)
//!     Reg-->>App: RouteMatch (unit + path params)
//!     App->>Chain: before → group → route
//!     Chain->>Term: handler or controller action
//!     Term-->>Chain: HandlerResponse
//!     Chain-->>App: response (outer layers may rewrite)
//!     App->>Chain: after stage (skipped when stopped)
//!     App->>Chain: finish stage (always)
//!     App-->>Caller: Result<HandlerResponse, DispatchError>
//! ```
//!
//! A middleware that returns without calling `next.run` short-circuits
//! everything inside it. Calling [`HandlerRequest::stop`](dispatcher::HandlerRequest::stop)
//! additionally skips the after stage; finish still runs.
//!
//! ## Quick Start
//!
//! ```rust
//! use stackroute::app::Application;
//! use stackroute::dispatcher::{HandlerRequest, HandlerResponse};
//! use stackroute::handler::Stage;
//! use stackroute::middleware::from_fn;
//! use stackroute::router::Collection;
//! use http::Method;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut app = Application::new();
//! app.before(from_fn(|req, next| {
//!     let mut res = next.run(req)?;
//!     res.set_header("x-powered-by", "stackroute".to_string());
//!     Ok(res)
//! }))?;
//!
//! let mut pets = Collection::named("pets");
//! pets.set_prefix("/pets");
//! pets.get("/{id}", [Stage::call(|req| {
//!     let id = req.get_path_param("id").unwrap_or_default().to_string();
//!     Ok(HandlerResponse::from(id))
//! })])?;
//! app.mount(&pets)?;
//!
//! let res = app.handle(HandlerRequest::new(Method::GET, "/pets/42"))?;
//! assert_eq!(res.status, 200);
//! assert_eq!(res.body, "42");
//! assert_eq!(res.get_header("x-powered-by"), Some("stackroute"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Runtime Considerations
//!
//! Dispatch is synchronous and `&self`; an [`Application`](app::Application)
//! is `Send + Sync` and can be shared behind an `Arc` by any server loop.
//! Setup methods take `&mut self` and are rejected once the first request has
//! been dispatched.

pub mod app;
pub mod cli;
pub mod container;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod runtime_config;

pub use app::Application;
pub use dispatcher::{HandlerRequest, HandlerResponse, HandlerResult};
pub use error::{ConfigError, DispatchError, MountError, RegistrationError, ResolveError};
pub use handler::{Controller, MainHandler, Stage};
pub use router::Collection;
