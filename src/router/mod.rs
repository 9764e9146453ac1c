//! # Router Module
//!
//! Route registration, the flattened registry and path matching.
//!
//! ## Overview
//!
//! - [`Route`] - pattern, method filter, ordered middleware, terminal handler.
//! - [`Collection`] - routes sharing a prefix, a main handler and group
//!   middleware. Routes are stored per method bucket (or the method-agnostic
//!   bucket) keyed by pattern.
//! - [`Registry`] - what a mount flattens collections into. Every entry is a
//!   [`DispatchUnit`] bundling the route with its collection context.
//! - [`PathMatcher`] - compiles patterns; [`RegexPathMatcher`] is the default.
//!
//! ## Resolution Order
//!
//! 1. The request method's bucket, then the method-agnostic bucket.
//! 2. Within a bucket, the first-registered pattern that matches.
//!
//! Registration order is part of the contract: with ambiguous templates such
//! as `/users/{id}` and `/users/{name}`, or `/users/{id}` and `/users/me`,
//! whichever was registered first wins. Register literal routes before the
//! placeholders that would shadow them.
//!
//! ## Example
//!
//! ```rust
//! use stackroute::dispatcher::HandlerResponse;
//! use stackroute::handler::Stage;
//! use stackroute::router::Collection;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut users = Collection::named("users");
//! users.set_prefix("/users");
//! users.get("/{id}", [Stage::call(|req| {
//!     let id = req.get_path_param("id").unwrap_or_default().to_string();
//!     Ok(HandlerResponse::from(id))
//! })])?;
//! assert_eq!(users.len(), 1);
//! # Ok(())
//! # }
//! ```

mod collection;
mod core;
mod matcher;
mod route;
#[cfg(test)]
mod tests;

pub use collection::Collection;
pub use core::{DispatchUnit, Origin, ParamVec, Registry, RouteMatch, MAX_INLINE_PARAMS};
pub use matcher::{validate_pattern, CompiledPattern, PathMatcher, RegexPathMatcher};
pub use route::{MethodFilter, MethodKey, Route, RouteInfo};
