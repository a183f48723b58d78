//! Observability subsystem.

pub mod logging;
pub mod observer;

pub use logging::init_tracing;
pub use observer::{Observer, TracingObserver};
