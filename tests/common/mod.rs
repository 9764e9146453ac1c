#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use stackroute::dispatcher::HandlerResponse;
use stackroute::handler::Stage;
use stackroute::middleware::{from_fn, Middleware};
use stackroute::HandlerRequest;

/// Shared log of stage labels in the order they ran.
#[derive(Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, label: &str) {
        self.0.lock().unwrap().push(label.to_string());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    /// Middleware recording `label` in its pre-phase and again in its
    /// post-phase.
    pub fn around(&self, label: &'static str) -> impl Middleware + 'static {
        let trace = self.clone();
        from_fn(move |req, next| {
            trace.push(label);
            let res = next.run(req)?;
            trace.push(label);
            Ok(res)
        })
    }

    /// Middleware recording `label` once, before continuing.
    pub fn enter(&self, label: &'static str) -> impl Middleware + 'static {
        let trace = self.clone();
        from_fn(move |req, next| {
            trace.push(label);
            next.run(req)
        })
    }

    /// Middleware recording `label`, stopping the request and answering
    /// `status` without calling `next`.
    pub fn stopper(&self, label: &'static str, status: u16) -> impl Middleware + 'static {
        let trace = self.clone();
        from_fn(move |req, _next| {
            trace.push(label);
            req.stop();
            Ok(HandlerResponse::error(status, "stopped"))
        })
    }

    /// Terminal handler recording `label` and echoing it as the body.
    pub fn terminal(&self, label: &'static str) -> Stage {
        let trace = self.clone();
        Stage::call(move |_| {
            trace.push(label);
            Ok(HandlerResponse::from(label))
        })
    }
}

pub fn get(path: &str) -> HandlerRequest {
    HandlerRequest::new(http::Method::GET, path)
}

pub fn request(method: http::Method, path: &str) -> HandlerRequest {
    HandlerRequest::new(method, path)
}
