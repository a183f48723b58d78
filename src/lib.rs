//! Promise-style HTTP result server.
//!
//! Sits between a raw HTTP transport and an application-supplied async
//! handler: whatever the handler produces (a value, a streaming sequence,
//! a structured error, or an unexpected fault) is turned into a correctly
//! framed response, with the wire representation chosen from the
//! request's Accept preference and long sequences streamed incrementally
//! under transport backpressure.
//!
//! ```no_run
//! use reply_server::{Endpoint, HandlerResult, Reply, RequestContext, Server};
//! use serde_json::json;
//!
//! async fn hello(_ctx: RequestContext) -> HandlerResult {
//!     Ok(Reply::Value(json!({"hello": "world"})))
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::new(Endpoint::Port(8080), hello);
//!
//!     let runner = server.clone();
//!     tokio::spawn(async move { runner.serve().await });
//!
//!     let address = server.ready().await;
//!     println!("listening on {address}");
//! }
//! ```

// Core subsystems
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use http::{
    BoxError, Format, Handler, HandlerError, HandlerResult, HttpError, Reply, RequestContext,
    Server, ServerError,
};
pub use net::{Endpoint, EndpointSpec, InvalidEndpoint};
pub use observability::{Observer, TracingObserver};
