//! Network layer subsystem.
//!
//! Endpoint classification and listener binding for the two endpoint
//! kinds (TCP port, unix socket path).

pub mod endpoint;
pub mod listener;

pub use endpoint::{Endpoint, EndpointSpec, InvalidEndpoint};
pub use listener::{Accepted, BindError, Listener};
