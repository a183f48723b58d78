//! Lifecycle management subsystem.
//!
//! Open/closed state with an awaitable ready signal, and the shutdown
//! coordinator that stops the accept loop.

pub mod shutdown;
pub mod state;

pub use shutdown::Shutdown;
pub use state::{Lifecycle, Phase};
