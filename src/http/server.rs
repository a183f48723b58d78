//! Server type and accept loop.
//!
//! # Responsibilities
//! - Own the endpoint, handler, request counter, and lifecycle state
//! - Bind the listener (with the socket-path conflict retry) and apply
//!   socket permissions
//! - Accept connections and serve each over hyper
//! - Assign strictly increasing request ids and hand each request to the
//!   dispatcher
//! - Graceful close via the shutdown coordinator
//!
//! The server owns its listener rather than extending a transport type;
//! lifecycle operations delegate to it.

use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use thiserror::Error;

use crate::http::dispatch::{dispatch, Handler};
use crate::http::writer;
use crate::lifecycle::{Lifecycle, Shutdown};
use crate::net::{Accepted, BindError, Endpoint, Listener};
use crate::observability::{Observer, TracingObserver};

/// Error type for server startup.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),
}

/// An HTTP server that turns handler outcomes into framed responses.
///
/// Cheap to clone; clones share the same lifecycle, counter, and handler,
/// so one clone can run the accept loop while another awaits readiness or
/// closes the server.
#[derive(Clone)]
pub struct Server {
    endpoint: Endpoint,
    handler: Arc<dyn Handler>,
    observer: Arc<dyn Observer>,
    counter: Arc<AtomicU64>,
    lifecycle: Lifecycle,
    shutdown: Shutdown,
}

impl Server {
    pub fn new(endpoint: Endpoint, handler: impl Handler) -> Self {
        Self {
            endpoint,
            handler: Arc::new(handler),
            observer: Arc::new(TracingObserver),
            counter: Arc::new(AtomicU64::new(0)),
            lifecycle: Lifecycle::new(),
            shutdown: Shutdown::new(),
        }
    }

    /// Replace the default tracing observer.
    pub fn with_observer(mut self, observer: impl Observer) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Resolve to the canonical address once open: `http://<host>:<port>`
    /// for ports, the path itself for socket paths. Never resolves after
    /// close.
    pub async fn ready(&self) -> String {
        self.lifecycle.ready().await
    }

    pub fn is_open(&self) -> bool {
        self.lifecycle.is_open()
    }

    /// Close the server: the accept loop stops and `ready` stops
    /// resolving. In-flight requests run to completion on their own tasks.
    pub fn close(&self) {
        self.lifecycle.set_closed();
        self.shutdown.trigger();
    }

    /// Bind and serve until closed.
    ///
    /// Bind failures (including a port conflict, or a socket-path conflict
    /// that survives the one stale-file retry) are fatal and surface here.
    pub async fn serve(&self) -> Result<(), ServerError> {
        // Subscribe before opening so a close racing with startup is not
        // missed between the two.
        let mut shutdown = self.shutdown.subscribe();

        let listener = Listener::bind(&self.endpoint).await?;
        listener.apply_permissions()?;
        let address = listener.local_address()?;

        tracing::info!(address = %address, "server listening");
        self.lifecycle.set_open(address);
        if !self.lifecycle.is_open() {
            // Closed before it ever opened.
            return Ok(());
        }

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                accepted = listener.accept() => match accepted {
                    Ok(conn) => self.spawn_connection(conn),
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                },
            }
        }

        self.lifecycle.set_closed();
        tracing::info!("server stopped");
        Ok(())
    }

    fn spawn_connection(&self, accepted: Accepted) {
        match accepted {
            Accepted::Tcp(stream, peer) => {
                tracing::debug!(peer = %peer, "connection accepted");
                self.serve_stream(TokioIo::new(stream));
            }
            Accepted::Unix(stream) => {
                tracing::debug!("unix connection accepted");
                self.serve_stream(TokioIo::new(stream));
            }
        }
    }

    fn serve_stream<IO>(&self, io: IO)
    where
        IO: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
    {
        let handler = self.handler.clone();
        let observer = self.observer.clone();
        let counter = self.counter.clone();

        tokio::spawn(async move {
            let service = service_fn(move |request| {
                let handler = handler.clone();
                let observer = observer.clone();
                // Id assignment happens at creation time and is the only
                // cross-request ordering guarantee.
                let id = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    let (writer, pending) = writer::channel();
                    tokio::spawn(dispatch(id, request, writer, handler, observer));
                    Ok::<_, Infallible>(pending.resolve().await)
                }
            });

            if let Err(e) = auto::Builder::new(TokioExecutor::new())
                .serve_connection(io, service)
                .await
            {
                tracing::debug!(error = %e, "connection ended with error");
            }
        });
    }
}
