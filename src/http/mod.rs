//! HTTP pipeline subsystem.
//!
//! Error model, content negotiation, response serialization, the
//! backpressured writer, and the per-request dispatcher.

pub mod dispatch;
pub mod error;
pub mod negotiate;
pub mod reply;
pub mod serialize;
pub mod server;
pub mod writer;

pub use dispatch::{Handler, HandlerResult, RequestContext};
pub use error::{BoxError, HandlerError, HttpError};
pub use negotiate::Format;
pub use reply::{Reply, ValueStream};
pub use server::{Server, ServerError};
pub use writer::{ResponseWriter, WriteError};
