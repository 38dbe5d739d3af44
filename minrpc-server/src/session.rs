//! Per-connection session.
//!
//! A session owns exactly one accepted socket and drives it through a
//! strict `Accepted → ReadingRequest → Dispatching → WritingResponse →
//! Closed` sequence, with an error exit from any state directly to
//! `Closed`. One request/response exchange per connection; no pipelining,
//! no keep-alive.

use crate::error::ServerError;
use bytes::BytesMut;
use minrpc_core::{RpcController, ServiceRegistry};
use minrpc_protocol::{ErrorCode, RequestFrame, ResponseEnvelope, ResponseFrame};
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

/// Initial capacity of the per-session receive buffer.
const READ_BUFFER_CAPACITY: usize = 8 * 1024;

/// Connection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Socket accepted, nothing read yet.
    Accepted,
    /// Reading bytes until a full request frame is buffered.
    ReadingRequest,
    /// Request decoded, resolving and invoking the handler.
    Dispatching,
    /// Handler finished, writing the framed response.
    WritingResponse,
    /// Connection shut down.
    Closed,
}

/// Server-side state for one accepted connection.
pub struct Session {
    /// Unique session ID, for log correlation.
    pub id: String,
    /// Remote peer address.
    pub remote_addr: SocketAddr,
    state: SessionState,
    buffer: BytesMut,
    handled: bool,
}

impl Session {
    /// Creates a session for a freshly accepted socket.
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            remote_addr,
            state: SessionState::Accepted,
            buffer: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
            handled: false,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a complete request frame was decoded on this connection.
    /// Empty or garbage connections never flip this.
    pub fn handled_request(&self) -> bool {
        self.handled
    }

    /// Drives the whole exchange: read one request, dispatch it, write the
    /// response, shut the connection down.
    ///
    /// Dispatch failures are answered with a structured error envelope
    /// before the connection closes, so the caller sees a descriptive
    /// remote error instead of a dropped connection.
    pub async fn serve<S>(
        &mut self,
        mut stream: S,
        registry: &ServiceRegistry,
    ) -> Result<(), ServerError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.state = SessionState::ReadingRequest;

        let frame = match self.read_request(&mut stream).await {
            Ok(frame) => frame,
            Err(ServerError::ConnectionClosed) => {
                // Peer connected and went away without sending anything.
                self.state = SessionState::Closed;
                return Ok(());
            }
            Err(e @ (ServerError::Protocol(_) | ServerError::TruncatedRequest { .. })) => {
                tracing::warn!(
                    session = %self.id,
                    peer = %self.remote_addr,
                    error = %e,
                    "failed to decode request frame"
                );
                let envelope = ResponseEnvelope::error(e.error_code(), e.to_string());
                self.state = SessionState::WritingResponse;
                let _ = self.write_envelope(&mut stream, &envelope).await;
                self.state = SessionState::Closed;
                return Err(e);
            }
            Err(e) => {
                self.state = SessionState::Closed;
                return Err(e);
            }
        };

        self.handled = true;
        self.state = SessionState::Dispatching;
        tracing::debug!(
            session = %self.id,
            peer = %self.remote_addr,
            service = %frame.header.service,
            method = %frame.header.method,
            args_len = frame.header.args_len,
            "dispatching request"
        );

        // One controller per inbound request; lifetime = this call.
        let mut controller = RpcController::new();
        let envelope = match registry.dispatch(
            &frame.header.service,
            &frame.header.method,
            &frame.args,
            &mut controller,
        ) {
            Ok(_) if controller.failed() => {
                ResponseEnvelope::error(ErrorCode::RemoteFailure, controller.error_text())
            }
            Ok(body) => ResponseEnvelope::ok(body),
            Err(e) => {
                tracing::warn!(
                    session = %self.id,
                    service = %frame.header.service,
                    method = %frame.header.method,
                    error = %e,
                    "dispatch failed"
                );
                ResponseEnvelope::error(e.error_code(), e.to_string())
            }
        };

        self.state = SessionState::WritingResponse;
        self.write_envelope(&mut stream, &envelope).await?;
        self.state = SessionState::Closed;
        Ok(())
    }

    /// Reads from the socket until the buffer holds a complete request
    /// frame.
    async fn read_request<S>(&mut self, stream: &mut S) -> Result<RequestFrame, ServerError>
    where
        S: AsyncRead + Unpin,
    {
        loop {
            if let Some(frame) = RequestFrame::decode(&mut self.buffer)? {
                return Ok(frame);
            }

            let n = stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                if self.buffer.is_empty() {
                    return Err(ServerError::ConnectionClosed);
                }
                return Err(ServerError::TruncatedRequest {
                    buffered: self.buffer.len(),
                });
            }
        }
    }

    /// Frames and writes the response envelope, then shuts the stream down.
    async fn write_envelope<S>(
        &mut self,
        stream: &mut S,
        envelope: &ResponseEnvelope,
    ) -> Result<(), ServerError>
    where
        S: AsyncWrite + Unpin,
    {
        let payload = serde_json::to_vec(envelope)?;
        let encoded = ResponseFrame::encode(&payload)?;
        stream.write_all(&encoded).await?;
        stream.shutdown().await?;
        Ok(())
    }
}
