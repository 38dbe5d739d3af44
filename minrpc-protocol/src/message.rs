//! Typed message contract and the response envelope.

use crate::error::{ErrorCode, ProtocolError};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Contract for request and response message types.
///
/// Any `Default + Serialize + Deserialize` type qualifies: `Default` is the
/// message factory the registry uses to produce an empty value of the
/// correct concrete type, serde provides the payload encoding.
pub trait RpcMessage: Serialize + DeserializeOwned + Default {
    /// Serializes the message into a wire payload.
    fn to_payload(&self) -> Result<Bytes, ProtocolError> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    /// Deserializes a message from a wire payload.
    fn from_payload(payload: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(payload)?)
    }
}

impl<T: Serialize + DeserializeOwned + Default> RpcMessage for T {}

/// Response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// Error details in an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    /// Stable error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
}

/// Envelope carried in every response payload.
///
/// Dispatch failures travel back to the caller as a structured error here
/// instead of a silently dropped connection, so the client can report
/// `SERVICE_NOT_FOUND` rather than a generic connection failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Outcome of the call.
    pub status: ResponseStatus,

    /// Error details, present when `status` is `Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,

    /// Serialized response message, present when `status` is `Ok`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ResponseEnvelope {
    /// Creates a success envelope around a response body.
    pub fn ok(body: Value) -> Self {
        Self {
            status: ResponseStatus::Ok,
            error: None,
            body: Some(body),
        }
    }

    /// Creates an error envelope.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            error: Some(ResponseError {
                code,
                message: message.into(),
            }),
            body: None,
        }
    }

    /// Returns whether this is a success envelope.
    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }
}
