//! Protocol error types and stable error codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Protocol-level errors raised while framing or parsing messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("frame segment too large: {size} bytes (max {max})")]
    FrameTooLarge { size: u32, max: u32 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid UTF-8 in header")]
    InvalidUtf8,
}

/// Stable error codes carried in error response envelopes.
///
/// These codes are part of the wire contract and must remain stable
/// across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request frame could not be decoded.
    MalformedFrame,
    /// No service registered under the requested name.
    ServiceNotFound,
    /// Service exists but has no such method.
    MethodNotFound,
    /// Argument payload did not decode into the request message type.
    ArgumentDecodeFailure,
    /// Request or response message failed to serialize.
    SerializationFailure,
    /// Connect/read/write I/O failure.
    ConnectionFailure,
    /// The handler marked the call failed on its controller.
    RemoteFailure,
    /// Unclassified server-side failure.
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::MalformedFrame => write!(f, "MALFORMED_FRAME"),
            ErrorCode::ServiceNotFound => write!(f, "SERVICE_NOT_FOUND"),
            ErrorCode::MethodNotFound => write!(f, "METHOD_NOT_FOUND"),
            ErrorCode::ArgumentDecodeFailure => write!(f, "ARGUMENT_DECODE_FAILURE"),
            ErrorCode::SerializationFailure => write!(f, "SERIALIZATION_FAILURE"),
            ErrorCode::ConnectionFailure => write!(f, "CONNECTION_FAILURE"),
            ErrorCode::RemoteFailure => write!(f, "REMOTE_FAILURE"),
            ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}
