//! Blocking call channel.
//!
//! The channel is deliberately synchronous: one thread, one fresh socket,
//! one round trip per call, no connection reuse. Connect, write, and read
//! all run under configurable deadlines so a stalled server cannot block a
//! caller forever.

use crate::error::ChannelError;
use minrpc_core::RpcController;
use minrpc_protocol::{
    ProtocolError, RequestFrame, ResponseEnvelope, RpcMessage, LEN_PREFIX_SIZE, MAX_FRAME_SIZE,
};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

/// Channel configuration.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Server address.
    pub addr: SocketAddr,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Deadline for the write and read phases of one call.
    pub call_timeout: Duration,
}

impl ChannelConfig {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connect_timeout: Duration::from_secs(10),
            call_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

/// The generic remote-invocation entry point.
///
/// Stateless apart from its configuration; cheap to clone and safe to share
/// across threads (every call opens its own connection).
#[derive(Debug, Clone)]
pub struct Channel {
    config: ChannelConfig,
}

impl Channel {
    /// Creates a channel targeting the configured server.
    pub fn new(config: ChannelConfig) -> Self {
        Self { config }
    }

    /// Returns the target address.
    pub fn addr(&self) -> SocketAddr {
        self.config.addr
    }

    /// Invokes a remote method, reporting any failure on `controller`.
    ///
    /// On failure the returned response is `Resp::default()` and must not
    /// be trusted: check `controller.failed()` first. A failed call never
    /// panics and never returns an `Err` to the caller.
    pub fn call<Req, Resp>(
        &self,
        service: &str,
        method: &str,
        request: &Req,
        controller: &mut RpcController,
    ) -> Resp
    where
        Req: RpcMessage,
        Resp: RpcMessage,
    {
        match self.try_call(service, method, request) {
            Ok(response) => response,
            Err(e) => {
                controller.set_failed(format!("{service}.{method}: {e}"));
                Resp::default()
            }
        }
    }

    /// Invokes a remote method with a `Result` surface, for callers that
    /// prefer `?` over the controller contract.
    pub fn try_call<Req, Resp>(
        &self,
        service: &str,
        method: &str,
        request: &Req,
    ) -> Result<Resp, ChannelError>
    where
        Req: RpcMessage,
        Resp: RpcMessage,
    {
        let args = request.to_payload()?;
        let frame = RequestFrame::encode(service, method, &args)?;

        tracing::debug!(
            %service,
            %method,
            args_len = args.len(),
            addr = %self.config.addr,
            "sending rpc request"
        );

        let envelope = self.round_trip(&frame)?;
        if let Some(error) = envelope.error {
            return Err(ChannelError::Remote {
                code: error.code,
                message: error.message,
            });
        }

        let body = envelope.body.ok_or(ChannelError::MissingBody)?;
        Ok(serde_json::from_value(body)?)
    }

    /// Opens a connection, writes the request frame, and reads back exactly
    /// one response frame.
    fn round_trip(&self, frame: &[u8]) -> Result<ResponseEnvelope, ChannelError> {
        let stream = TcpStream::connect_timeout(&self.config.addr, self.config.connect_timeout)?;
        stream.set_nodelay(true).ok();
        stream.set_write_timeout(Some(self.config.call_timeout))?;
        stream.set_read_timeout(Some(self.config.call_timeout))?;

        let mut stream = stream;
        stream.write_all(frame)?;

        // Length prefix first, then exactly that many payload bytes.
        let mut len_buf = [0u8; LEN_PREFIX_SIZE];
        stream.read_exact(&mut len_buf)?;
        let payload_len = u32::from_be_bytes(len_buf);
        if payload_len > MAX_FRAME_SIZE {
            return Err(ChannelError::Protocol(ProtocolError::FrameTooLarge {
                size: payload_len,
                max: MAX_FRAME_SIZE,
            }));
        }

        let mut payload = vec![0u8; payload_len as usize];
        stream.read_exact(&mut payload)?;

        tracing::debug!(payload_len, "received rpc response");
        Ok(serde_json::from_slice(&payload)?)
    }
}
