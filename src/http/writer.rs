//! Backpressured response writer.
//!
//! # Responsibilities
//! - Carry the status line and headers to the transport exactly once
//! - Stream body chunks through a bounded channel so encoding suspends
//!   while the transport drains
//! - Track whether headers are already out, so a late error cannot write
//!   a second status line
//!
//! A [`ResponseWriter`]/[`PendingResponse`] pair is created per request.
//! The dispatcher task drives the writer; the connection task resolves
//! the pending side into the `hyper` response once the head arrives.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response, StatusCode};
use hyper::body::{Body, Frame, SizeHint};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Body chunks queued ahead of the transport before a write suspends.
const WRITE_QUEUE: usize = 8;

/// Error type for writer operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WriteError {
    /// The connection is gone; remaining writes cannot be delivered.
    #[error("connection closed")]
    Closed,

    /// The head was already sent.
    #[error("headers already sent")]
    HeadersSent,

    /// The response body was already finished.
    #[error("response already finished")]
    Finished,
}

/// Status line and headers, sent once before any body byte.
#[derive(Debug)]
pub(crate) struct Head {
    pub status: StatusCode,
    pub reason: Option<String>,
    pub content_type: Option<&'static str>,
}

/// Write half of one response.
pub struct ResponseWriter {
    head: Option<oneshot::Sender<Head>>,
    body: Option<mpsc::Sender<Bytes>>,
}

/// Read half: resolves into the transport response once the head arrives.
pub(crate) struct PendingResponse {
    head: oneshot::Receiver<Head>,
    body: ChannelBody,
}

/// Create a writer/pending pair for one request.
pub(crate) fn channel() -> (ResponseWriter, PendingResponse) {
    let (head_tx, head_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(WRITE_QUEUE);
    (
        ResponseWriter {
            head: Some(head_tx),
            body: Some(body_tx),
        },
        PendingResponse {
            head: head_rx,
            body: ChannelBody { rx: body_rx },
        },
    )
}

impl ResponseWriter {
    /// Whether the status line and headers have already gone out.
    pub fn headers_sent(&self) -> bool {
        self.head.is_none()
    }

    /// Send the status line and headers. Errors if already sent.
    pub fn send_head(
        &mut self,
        status: StatusCode,
        reason: Option<String>,
        content_type: Option<&'static str>,
    ) -> Result<(), WriteError> {
        let tx = self.head.take().ok_or(WriteError::HeadersSent)?;
        tx.send(Head {
            status,
            reason,
            content_type,
        })
        .map_err(|_| WriteError::Closed)
    }

    /// Write one body chunk.
    ///
    /// Suspends while the queue to the transport is full; this is the
    /// backpressure point that bounds memory for streamed sequences.
    pub async fn write(&mut self, chunk: Bytes) -> Result<(), WriteError> {
        let tx = self.body.as_ref().ok_or(WriteError::Finished)?;
        tx.send(chunk).await.map_err(|_| WriteError::Closed)
    }

    /// Close the body. Idempotent; a no-op once called, and harmless when
    /// the connection is already gone.
    pub fn finish(&mut self) {
        self.body.take();
    }

    pub fn is_finished(&self) -> bool {
        self.body.is_none()
    }
}

impl PendingResponse {
    /// Wait for the head and assemble the transport response.
    ///
    /// A writer dropped without sending a head (a dispatcher that never
    /// got that far) resolves to a bare 500.
    pub(crate) async fn resolve(self) -> Response<ChannelBody> {
        let mut response = Response::new(self.body);
        match self.head.await {
            Ok(head) => {
                *response.status_mut() = head.status;
                if let Some(content_type) = head.content_type {
                    response
                        .headers_mut()
                        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
                }
                if let Some(reason) = head.reason {
                    // Custom reason phrases only differ from the canonical
                    // one for errors carrying a message.
                    if head.status.canonical_reason() != Some(reason.as_str()) {
                        if let Ok(phrase) = hyper::ext::ReasonPhrase::try_from(Bytes::from(reason))
                        {
                            response.extensions_mut().insert(phrase);
                        }
                    }
                }
            }
            Err(_) => {
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            }
        }
        response
    }
}

/// Response body fed from the writer's bounded channel.
pub struct ChannelBody {
    rx: mpsc::Receiver<Bytes>,
}

impl Body for ChannelBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.get_mut()
            .rx
            .poll_recv(cx)
            .map(|chunk| chunk.map(|bytes| Ok(Frame::data(bytes))))
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::default()
    }
}
