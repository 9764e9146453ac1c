//! # Dispatcher Module
//!
//! Request and response types plus the onion chain that middleware runs in.
//!
//! ## Overview
//!
//! - [`HandlerRequest`] carries the method, path, captured placeholders,
//!   headers, body and the request-scoped dispatch context (stop flag,
//!   active handler).
//! - [`HandlerResponse`] is the status/headers/JSON body triple every stage
//!   returns.
//! - [`Next`] is the continuation a middleware receives. It is consumed by
//!   [`Next::run`], so calling it twice does not compile.
//!
//! ## Chain Shape
//!
//! ```text
//! before[0] → … → group[0] → … → route[0] → … → terminal
//!                                                    │
//! before[0] ← … ← group[0] ← … ← route[0] ← … ←──────┘
//! ```
//!
//! Pre-phases run in registration order and post-phases unwind in reverse,
//! so a middleware that opens a resource before calling `next` always
//! closes it after the inner stages returned.

mod chain;
mod core;

pub use chain::{Endpoint, Link, Next, Scope};
pub use core::{
    ActiveHandler, ActiveTarget, DispatchContext, HandlerRequest, HandlerResponse, HandlerResult,
    HeaderVec, MAX_INLINE_HEADERS,
};
