//! Server error types.

use minrpc_core::DispatchError;
use minrpc_protocol::{ErrorCode, ProtocolError};
use thiserror::Error;

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connection closed by peer before a request arrived")]
    ConnectionClosed,

    #[error("truncated request: peer closed mid-frame with {buffered} bytes buffered")]
    TruncatedRequest { buffered: usize },

    #[error("connection limit reached")]
    ConnectionLimit,
}

impl ServerError {
    /// Converts to the stable wire error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ServerError::Io(_) => ErrorCode::ConnectionFailure,
            ServerError::Protocol(_) => ErrorCode::MalformedFrame,
            ServerError::Dispatch(e) => e.error_code(),
            ServerError::Json(_) => ErrorCode::SerializationFailure,
            ServerError::ConnectionClosed => ErrorCode::ConnectionFailure,
            ServerError::TruncatedRequest { .. } => ErrorCode::MalformedFrame,
            ServerError::ConnectionLimit => ErrorCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = ServerError::Protocol(ProtocolError::MalformedFrame("x".into()));
        assert_eq!(err.error_code(), ErrorCode::MalformedFrame);

        let err = ServerError::Dispatch(DispatchError::ServiceNotFound("S".into()));
        assert_eq!(err.error_code(), ErrorCode::ServiceNotFound);

        let err = ServerError::TruncatedRequest { buffered: 3 };
        assert_eq!(err.error_code(), ErrorCode::MalformedFrame);

        let err = ServerError::ConnectionLimit;
        assert_eq!(err.error_code(), ErrorCode::InternalError);
    }
}
