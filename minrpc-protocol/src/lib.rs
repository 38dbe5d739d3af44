//! # minrpc-protocol
//!
//! Wire protocol implementation for minrpc.
//!
//! This crate provides:
//! - Length-prefixed binary framing for requests and responses
//! - The request header carrying the dispatch target (service, method)
//! - The `RpcMessage` trait used for typed request/response payloads
//! - The response envelope and stable error codes
//!
//! The codec is pure encode/decode: no I/O happens here. Transports feed
//! received bytes into a [`BytesMut`](bytes::BytesMut) buffer and call the
//! incremental `decode` functions until a full frame is available.

pub mod error;
pub mod frame;
pub mod message;

pub use error::{ErrorCode, ProtocolError};
pub use frame::{RequestFrame, RequestHeader, ResponseFrame, LEN_PREFIX_SIZE};
pub use message::{ResponseEnvelope, ResponseError, ResponseStatus, RpcMessage};

/// Default port for minrpc servers.
pub const DEFAULT_PORT: u16 = 7801;

/// Maximum size accepted for a frame segment (header or payload), 16 MiB.
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;
