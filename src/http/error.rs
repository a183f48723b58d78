//! Error model for handler outcomes.
//!
//! Two tiers: [`HttpError`] is intentional and surfaces to the client
//! verbatim; everything else is a fault, answered with a fixed generic
//! 500 and reported to the observability collaborator.

use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Boxed error for faults crossing the handler boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Body of the generic response written for faults. Fixed, so internal
/// detail never leaks to the client.
pub const FAULT_MESSAGE: &str = "Internal server error. Appropriate staff has been notified.";

/// An intentional, client-facing error with an explicit status code.
///
/// The status line carries the code and message; an optional body is
/// serialized under the request's negotiated format.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{} {message}", .code.as_u16())]
pub struct HttpError {
    pub code: StatusCode,
    pub message: String,
    pub body: Option<Value>,
}

impl HttpError {
    /// Error with the canonical reason phrase for `code` as its message.
    pub fn new(code: StatusCode) -> Self {
        Self {
            message: reason_phrase(code),
            code,
            body: None,
        }
    }

    /// Error with an explicit message. An empty message falls back to the
    /// canonical reason phrase.
    pub fn with_message(code: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            message: if message.is_empty() {
                reason_phrase(code)
            } else {
                message
            },
            code,
            body: None,
        }
    }

    /// Error constructed from a message alone: code defaults to 500.
    pub fn message(message: impl Into<String>) -> Self {
        Self::with_message(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Attach a body, serialized under the negotiated format when written.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Standard reason phrase for a status code, or the numeric code itself
/// for codes without an assigned phrase.
pub fn reason_phrase(code: StatusCode) -> String {
    code.canonical_reason()
        .map(str::to_owned)
        .unwrap_or_else(|| code.as_u16().to_string())
}

/// Tagged outcome of a failed handler invocation.
///
/// Makes the two-tier error routing explicit: a structured error goes to
/// the client as-is, a fault is collapsed to a generic 500.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("handler fault: {0}")]
    Fault(BoxError),
}

impl HandlerError {
    /// Wrap any error as a fault.
    pub fn fault(error: impl Into<BoxError>) -> Self {
        HandlerError::Fault(error.into())
    }
}
