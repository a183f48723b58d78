//! Listener binding for both endpoint kinds.
//!
//! # Responsibilities
//! - Bind a TCP or unix listener for a resolved [`Endpoint`]
//! - Recover once from a stale socket file on bind conflict
//! - Apply world-accessible permissions to socket paths after bind
//! - Report the canonical address of the bound listener

use std::io;
use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream, UnixListener, UnixStream};

use crate::net::endpoint::Endpoint;

/// Error type for bind operations.
#[derive(Debug, Error)]
pub enum BindError {
    /// TCP port already in use. Ports are never retried.
    #[error("port {0} in use")]
    PortInUse(u16),

    /// Socket path still in use after the one allowed stale-file retry.
    #[error("socket {} in use", .0.display())]
    SocketInUse(PathBuf),

    /// Any other bind failure.
    #[error("failed to bind endpoint: {0}")]
    Io(#[from] io::Error),
}

/// A bound listener over one of the two endpoint kinds.
pub struct Listener {
    inner: ListenerKind,
    endpoint: Endpoint,
}

enum ListenerKind {
    Tcp(TcpListener),
    Unix(UnixListener),
}

/// One accepted connection.
pub enum Accepted {
    Tcp(TcpStream, SocketAddr),
    Unix(UnixStream),
}

impl Listener {
    /// Bind to the given endpoint.
    ///
    /// For a socket path, a bind conflict is assumed to be a stale file
    /// left behind by a previous process: the path is unlinked and the
    /// bind retried exactly once. A port conflict fails immediately.
    pub async fn bind(endpoint: &Endpoint) -> Result<Self, BindError> {
        let inner = match endpoint {
            Endpoint::Port(port) => {
                let addr = SocketAddr::from(([0, 0, 0, 0], *port));
                let listener = TcpListener::bind(addr).await.map_err(|e| {
                    if e.kind() == io::ErrorKind::AddrInUse {
                        BindError::PortInUse(*port)
                    } else {
                        BindError::Io(e)
                    }
                })?;
                ListenerKind::Tcp(listener)
            }
            Endpoint::SocketPath(path) => ListenerKind::Unix(bind_unix(path)?),
        };

        Ok(Self {
            inner,
            endpoint: endpoint.clone(),
        })
    }

    /// Make a socket path world-accessible so co-located processes without
    /// matching credentials can connect. No-op for port endpoints.
    pub fn apply_permissions(&self) -> io::Result<()> {
        if let Endpoint::SocketPath(path) = &self.endpoint {
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o777))?;
            tracing::debug!(path = %path.display(), "socket permissions set to 0777");
        }
        Ok(())
    }

    /// Canonical address of the bound listener: `http://<host>:<port>` for
    /// ports (with `localhost` standing in for the unspecified address),
    /// the path itself for socket paths.
    pub fn local_address(&self) -> io::Result<String> {
        match &self.inner {
            ListenerKind::Tcp(listener) => {
                let addr = listener.local_addr()?;
                let host = if addr.ip().is_unspecified() {
                    "localhost".to_string()
                } else {
                    addr.ip().to_string()
                };
                Ok(format!("http://{}:{}", host, addr.port()))
            }
            ListenerKind::Unix(_) => match &self.endpoint {
                Endpoint::SocketPath(path) => Ok(path.display().to_string()),
                Endpoint::Port(_) => unreachable!("unix listener with port endpoint"),
            },
        }
    }

    /// Accept one connection.
    pub async fn accept(&self) -> io::Result<Accepted> {
        match &self.inner {
            ListenerKind::Tcp(listener) => {
                let (stream, peer) = listener.accept().await?;
                Ok(Accepted::Tcp(stream, peer))
            }
            ListenerKind::Unix(listener) => {
                let (stream, _) = listener.accept().await?;
                Ok(Accepted::Unix(stream))
            }
        }
    }
}

fn bind_unix(path: &Path) -> Result<UnixListener, BindError> {
    match UnixListener::bind(path) {
        Ok(listener) => Ok(listener),
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
            tracing::debug!(path = %path.display(), "socket path in use, removing stale file");
            std::fs::remove_file(path)?;
            UnixListener::bind(path).map_err(|e| {
                if e.kind() == io::ErrorKind::AddrInUse {
                    BindError::SocketInUse(path.to_path_buf())
                } else {
                    BindError::Io(e)
                }
            })
        }
        Err(e) => Err(BindError::Io(e)),
    }
}
