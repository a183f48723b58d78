//! Injectable observability collaborator.
//!
//! The dispatcher reports request timing and faults through this trait
//! instead of ambient global state, so tests can substitute a capturing
//! stub.

use std::time::Duration;

use http::Method;

use crate::http::error::BoxError;

/// Sink for per-request operational events.
pub trait Observer: Send + Sync + 'static {
    /// A request context was created.
    fn request_started(&self, _id: u64, _method: &Method, _path: &str) {}

    /// The request reached its terminal state.
    fn request_finished(&self, _id: u64, _elapsed: Duration) {}

    /// An unanticipated fault, already answered to the client with a
    /// generic 500 where possible. Never reflected into the response body.
    fn fault(&self, _id: u64, _error: &BoxError) {}
}

/// Default observer: structured logs via `tracing`.
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn request_started(&self, id: u64, method: &Method, path: &str) {
        tracing::debug!(request_id = id, method = %method, path = %path, "serving request");
    }

    fn request_finished(&self, id: u64, elapsed: Duration) {
        tracing::debug!(request_id = id, elapsed_ms = elapsed.as_millis() as u64, "request finished");
    }

    fn fault(&self, id: u64, error: &BoxError) {
        tracing::error!(request_id = id, error = %error, "request raised fatal error");
    }
}
