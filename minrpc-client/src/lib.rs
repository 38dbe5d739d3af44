//! # minrpc-client
//!
//! Client channel for minrpc.
//!
//! This crate provides the generic "invoke this remote method" entry point
//! used by every caller: the [`Channel`] encodes a request frame, opens a
//! fresh blocking TCP connection, performs one round trip, and decodes the
//! response. Failures are reported through the per-call
//! [`RpcController`](minrpc_core::RpcController) rather than raised, so
//! callers must check `controller.failed()` before trusting a response.

pub mod channel;
pub mod error;

pub use channel::{Channel, ChannelConfig};
pub use error::ChannelError;
