//! Dispatch error types.

use minrpc_protocol::ErrorCode;
use thiserror::Error;

/// Errors raised while registering services or dispatching calls.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("service already registered: {0}")]
    DuplicateService(String),

    #[error("service not found: {0}")]
    ServiceNotFound(String),

    #[error("method not found: {service}.{method}")]
    MethodNotFound { service: String, method: String },

    #[error("argument decode failed: {0}")]
    ArgumentDecode(String),

    #[error("response serialization failed: {0}")]
    Serialization(String),
}

impl DispatchError {
    /// Converts to the stable wire error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            DispatchError::DuplicateService(_) => ErrorCode::InternalError,
            DispatchError::ServiceNotFound(_) => ErrorCode::ServiceNotFound,
            DispatchError::MethodNotFound { .. } => ErrorCode::MethodNotFound,
            DispatchError::ArgumentDecode(_) => ErrorCode::ArgumentDecodeFailure,
            DispatchError::Serialization(_) => ErrorCode::SerializationFailure,
        }
    }
}
