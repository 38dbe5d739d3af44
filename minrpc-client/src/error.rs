//! Channel error types.

use minrpc_protocol::{ErrorCode, ProtocolError};
use thiserror::Error;

/// Channel errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("remote error: {code} - {message}")]
    Remote { code: ErrorCode, message: String },

    #[error("server sent an ok envelope without a body")]
    MissingBody,
}

impl ChannelError {
    /// Returns whether this is a transport-level failure (as opposed to a
    /// failure the server reported).
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, ChannelError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failure_classification() {
        let err = ChannelError::Io(std::io::Error::from(std::io::ErrorKind::TimedOut));
        assert!(err.is_connection_failure());

        let err = ChannelError::Remote {
            code: ErrorCode::ServiceNotFound,
            message: "nope".into(),
        };
        assert!(!err.is_connection_failure());
    }
}
