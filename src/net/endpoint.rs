//! Endpoint classification.
//!
//! # Responsibilities
//! - Classify a bind target as a network port or a filesystem socket path
//! - Reject targets that are neither
//!
//! Classification is pure; binding happens in [`crate::net::Listener`].

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Error returned when a bind target is neither a port nor a socket path.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid endpoint: expected a port in 0-65535 or a socket path")]
pub struct InvalidEndpoint;

/// Where a server binds: a TCP port on all interfaces, or a unix socket
/// path.
///
/// Fixed for the lifetime of the server that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Port(u16),
    SocketPath(PathBuf),
}

/// Untagged input form for an endpoint, as it appears in config-style
/// sources: a bare integer or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EndpointSpec {
    Port(i64),
    Path(String),
}

impl Endpoint {
    /// Resolve an input value into an endpoint.
    ///
    /// Integers must fall in 0-65535. Strings that parse as an in-range
    /// port number count as ports; any other non-empty string is a socket
    /// path.
    pub fn resolve(spec: EndpointSpec) -> Result<Self, InvalidEndpoint> {
        match spec {
            EndpointSpec::Port(n) => u16::try_from(n)
                .map(Endpoint::Port)
                .map_err(|_| InvalidEndpoint),
            EndpointSpec::Path(s) => {
                if let Ok(port) = s.parse::<u16>() {
                    Ok(Endpoint::Port(port))
                } else if s.is_empty() {
                    Err(InvalidEndpoint)
                } else {
                    Ok(Endpoint::SocketPath(PathBuf::from(s)))
                }
            }
        }
    }

    pub fn is_socket(&self) -> bool {
        matches!(self, Endpoint::SocketPath(_))
    }
}

impl From<u16> for Endpoint {
    fn from(port: u16) -> Self {
        Endpoint::Port(port)
    }
}

impl From<PathBuf> for Endpoint {
    fn from(path: PathBuf) -> Self {
        Endpoint::SocketPath(path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Port(port) => write!(f, "port {port}"),
            Endpoint::SocketPath(path) => write!(f, "socket {}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_in_range_is_port() {
        assert_eq!(
            Endpoint::resolve(EndpointSpec::Port(8080)).unwrap(),
            Endpoint::Port(8080)
        );
        assert_eq!(
            Endpoint::resolve(EndpointSpec::Port(0)).unwrap(),
            Endpoint::Port(0)
        );
        assert_eq!(
            Endpoint::resolve(EndpointSpec::Port(65535)).unwrap(),
            Endpoint::Port(65535)
        );
    }

    #[test]
    fn integer_out_of_range_is_invalid() {
        assert_eq!(
            Endpoint::resolve(EndpointSpec::Port(65536)),
            Err(InvalidEndpoint)
        );
        assert_eq!(
            Endpoint::resolve(EndpointSpec::Port(-1)),
            Err(InvalidEndpoint)
        );
    }

    #[test]
    fn numeric_string_is_port() {
        let ep = Endpoint::resolve(EndpointSpec::Path("8080".into())).unwrap();
        assert_eq!(ep, Endpoint::Port(8080));
    }

    #[test]
    fn other_string_is_socket_path() {
        let ep = Endpoint::resolve(EndpointSpec::Path("/tmp/app.sock".into())).unwrap();
        assert_eq!(ep, Endpoint::SocketPath(PathBuf::from("/tmp/app.sock")));
        assert!(ep.is_socket());
    }

    #[test]
    fn empty_string_is_invalid() {
        assert_eq!(
            Endpoint::resolve(EndpointSpec::Path(String::new())),
            Err(InvalidEndpoint)
        );
    }

    #[test]
    fn deserializes_untagged() {
        let spec: EndpointSpec = serde_json::from_str("3000").unwrap();
        assert_eq!(Endpoint::resolve(spec).unwrap(), Endpoint::Port(3000));

        let spec: EndpointSpec = serde_json::from_str("\"/run/app.sock\"").unwrap();
        assert!(Endpoint::resolve(spec).unwrap().is_socket());
    }
}
