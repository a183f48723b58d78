//! Handler outcome shapes.

use std::fmt;

use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use http::StatusCode;
use serde_json::Value;

use crate::http::error::HttpError;

/// A sequence of values produced incrementally, streamed to the client
/// without full buffering.
pub type ValueStream = BoxStream<'static, Value>;

/// What a handler hands back on success.
pub enum Reply {
    /// Nothing: 200 with an empty body, no content type.
    Empty,
    /// A materialized value, fully serialized before writing.
    Value(Value),
    /// A materialized value paired with an explicit status code.
    Status(StatusCode, Value),
    /// A sequence, encoded incrementally under the negotiated format.
    Stream(ValueStream),
    /// A structured error returned (not raised) as a value; routed through
    /// the same path as a raised one.
    Error(HttpError),
}

impl Reply {
    /// Wrap a serializable value.
    pub fn value(value: impl serde::Serialize) -> Result<Self, serde_json::Error> {
        Ok(Reply::Value(serde_json::to_value(value)?))
    }

    /// Wrap a stream of values.
    pub fn stream(stream: impl Stream<Item = Value> + Send + 'static) -> Self {
        Reply::Stream(stream.boxed())
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Value(value)
    }
}

impl From<HttpError> for Reply {
    fn from(error: HttpError) -> Self {
        Reply::Error(error)
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Empty => write!(f, "Empty"),
            Reply::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Reply::Status(code, v) => f.debug_tuple("Status").field(code).field(v).finish(),
            Reply::Stream(_) => write!(f, "Stream(..)"),
            Reply::Error(e) => f.debug_tuple("Error").field(e).finish(),
        }
    }
}
