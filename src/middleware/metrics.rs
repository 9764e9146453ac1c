use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResult, Next};

/// Middleware for collecting request metrics
///
/// All counters use atomic operations for thread-safe updates without locks,
/// so one instance can be shared by every concurrent `handle()` call.
///
/// Metrics collected:
/// - Total request count
/// - Error count (stages that returned `Err`)
/// - Average latency of the downstream stages
/// - Per-status response counts
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    error_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    status_counts: DashMap<u16, usize>,
}

impl Default for MetricsMiddleware {
    fn default() -> Self {
        Self {
            request_count: AtomicUsize::new(0),
            error_count: AtomicUsize::new(0),
            total_latency_ns: AtomicU64::new(0),
            status_counts: DashMap::new(),
        }
    }
}

impl MetricsMiddleware {
    /// Create a new metrics middleware with all counters initialized to zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests processed
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Number of requests whose downstream stages failed
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Calculate the average request latency
    ///
    /// Returns zero duration if no requests have been processed yet.
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Number of responses observed with the given status
    pub fn status_count(&self, status: u16) -> usize {
        self.status_counts.get(&status).map_or(0, |c| *c)
    }
}

impl Middleware for MetricsMiddleware {
    fn invoke(&self, req: &mut HandlerRequest, next: Next<'_>) -> HandlerResult {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();
        let result = next.run(req);
        self.total_latency_ns
            .fetch_add(start.elapsed().as_nanos() as u64, Ordering::Relaxed);

        match &result {
            Ok(res) => *self.status_counts.entry(res.status).or_insert(0) += 1,
            Err(_) => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }
}
