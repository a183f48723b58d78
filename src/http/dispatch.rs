//! Per-request dispatch.
//!
//! One request moves through: received (fresh id), handling (the handler
//! runs, possibly suspending), one of three interpretations (result,
//! caught structured error, fault), then finalization. Finalization is
//! reached exactly once on every path; it closes the body and reports
//! elapsed time to the observer.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::BoxFuture;
use http::header::ACCEPT;
use http::{Request, StatusCode};
use hyper::body::Incoming;

use crate::http::error::{BoxError, HandlerError, HttpError, FAULT_MESSAGE};
use crate::http::negotiate::Format;
use crate::http::reply::Reply;
use crate::http::serialize;
use crate::http::writer::ResponseWriter;
use crate::observability::Observer;

/// Everything a handler gets for one request. Exclusively owned by the
/// request's task; never shared across requests.
pub struct RequestContext {
    /// Strictly increasing per server, never reused.
    pub id: u64,
    /// The parsed request, body included.
    pub request: Request<Incoming>,
    started: Instant,
}

impl RequestContext {
    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }
}

/// Outcome of one handler invocation.
pub type HandlerResult = Result<Reply, HandlerError>;

/// The application's request handler.
///
/// Produces, asynchronously, an ordinary value, a sequence to stream, a
/// structured error (returned or raised), nothing, or a fault.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, ctx: RequestContext) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn handle(&self, ctx: RequestContext) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(ctx))
    }
}

/// Drive one request from received to finalized.
pub(crate) async fn dispatch(
    id: u64,
    request: Request<Incoming>,
    mut writer: ResponseWriter,
    handler: Arc<dyn Handler>,
    observer: Arc<dyn Observer>,
) {
    let started = Instant::now();
    observer.request_started(id, request.method(), request.uri().path());

    // Negotiation input is captured up front; the handler consumes the
    // request, and the content-type must be fixed before the first write.
    let accept = request
        .headers()
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let format = Format::negotiate(accept.as_deref());

    let ctx = RequestContext {
        id,
        request,
        started,
    };

    match handler.handle(ctx).await {
        Ok(Reply::Error(error)) | Err(HandlerError::Http(error)) => {
            caught(&mut writer, format, id, &error).await;
        }
        Ok(reply) => {
            if let Err(e) = serialize::write_result(&mut writer, format, reply).await {
                faulted(&mut writer, format, id, Box::new(e), observer.as_ref()).await;
            }
        }
        Err(HandlerError::Fault(error)) => {
            faulted(&mut writer, format, id, error, observer.as_ref()).await;
        }
    }

    // Finalized: close the body exactly once, a no-op if the connection
    // is already gone, and record elapsed time.
    writer.finish();
    observer.request_finished(id, started.elapsed());
}

/// A structured error surfaces to the client verbatim.
async fn caught(writer: &mut ResponseWriter, format: Format, id: u64, error: &HttpError) {
    tracing::debug!(
        request_id = id,
        code = error.code.as_u16(),
        message = %error.message,
        "request raised http error"
    );
    // A write failure here means the connection is gone; nothing left to do
    // for this exchange.
    let _ = serialize::write_error(writer, format, error).await;
}

/// A fault answers the client with a fixed generic 500 (headers
/// permitting) and is forwarded to the observer, never swallowed.
async fn faulted(
    writer: &mut ResponseWriter,
    format: Format,
    id: u64,
    error: BoxError,
    observer: &dyn Observer,
) {
    if !writer.headers_sent() {
        let generic = HttpError::with_message(StatusCode::INTERNAL_SERVER_ERROR, FAULT_MESSAGE);
        let _ = serialize::write_error(writer, format, &generic).await;
    }
    observer.fault(id, &error);
}
