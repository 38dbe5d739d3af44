//! TCP provider.
//!
//! The server owns the read-only service registry, accepts inbound
//! connections, and spawns one task per connection. The tokio multi-thread
//! runtime is the shared reactor plus worker pool: any connection's
//! continuation may run on any worker thread, while each session's socket
//! and buffer stay owned by that session's task. The spawned task keeps
//! the session alive for as long as any I/O against it is outstanding.

use crate::error::ServerError;
use crate::session::Session;
use minrpc_core::ServiceRegistry;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("127.0.0.1:{}", minrpc_protocol::DEFAULT_PORT)
                .parse()
                .unwrap(),
            max_connections: 1000,
        }
    }
}

impl ServerConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }
}

/// Server statistics.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub connections_total: AtomicU64,
    pub connections_active: AtomicU64,
    pub requests_total: AtomicU64,
    pub errors_total: AtomicU64,
}

/// TCP provider for minrpc.
pub struct Server {
    config: ServerConfig,
    registry: Arc<ServiceRegistry>,
    stats: Arc<ServerStats>,
    shutdown: broadcast::Sender<()>,
    running: AtomicBool,
}

impl Server {
    /// Creates a new server over a fully registered service table.
    ///
    /// The registry must be complete at this point: no further registration
    /// happens once connections are being accepted, which is what makes
    /// lock-free dispatch safe.
    pub fn new(config: ServerConfig, registry: Arc<ServiceRegistry>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            registry,
            stats: Arc::new(ServerStats::default()),
            shutdown: shutdown_tx,
            running: AtomicBool::new(false),
        }
    }

    /// Binds the configured address and runs the accept loop.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Runs the accept loop on an already bound listener.
    ///
    /// Separated from [`run`](Server::run) so tests can bind an ephemeral
    /// port and learn the actual address first.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        self.running.store(true, Ordering::SeqCst);

        tracing::info!(
            addr = %listener.local_addr()?,
            services = self.registry.len(),
            "server listening"
        );
        for name in self.registry.service_names() {
            tracing::debug!(service = %name, "serving");
        }

        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.stats.connections_active.load(Ordering::Relaxed)
                                >= self.config.max_connections as u64
                            {
                                let err = ServerError::ConnectionLimit;
                                tracing::warn!(peer = %addr, error = %err, "rejecting connection");
                                self.stats.errors_total.fetch_add(1, Ordering::Relaxed);
                                continue;
                            }

                            self.stats.connections_total.fetch_add(1, Ordering::Relaxed);
                            self.stats.connections_active.fetch_add(1, Ordering::Relaxed);

                            let registry = self.registry.clone();
                            let stats = self.stats.clone();

                            tokio::spawn(async move {
                                stream.set_nodelay(true).ok();

                                let mut session = Session::new(addr);
                                tracing::debug!(
                                    session = %session.id,
                                    peer = %addr,
                                    "connection accepted"
                                );

                                let result = session.serve(stream, &registry).await;

                                // A connection only counts as a request once a
                                // full frame decoded; empty or garbage
                                // connections stay out of this counter.
                                if session.handled_request() {
                                    stats.requests_total.fetch_add(1, Ordering::Relaxed);
                                }

                                if let Err(e) = result {
                                    tracing::debug!(
                                        session = %session.id,
                                        peer = %addr,
                                        error = %e,
                                        "connection ended with error"
                                    );
                                    stats.errors_total.fetch_add(1, Ordering::Relaxed);
                                }

                                stats.connections_active.fetch_sub(1, Ordering::Relaxed);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "accept error");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("server shutting down");
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Signals the accept loop to stop. In-flight connections finish on
    /// their own tasks.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// Returns whether the accept loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Returns the server statistics.
    pub fn stats(&self) -> Arc<ServerStats> {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use minrpc_core::{RpcController, ServiceBuilder};
    use minrpc_protocol::{RequestFrame, ResponseEnvelope, ResponseFrame};
    use serde::{Deserialize, Serialize};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct EchoRequest {
        text: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct EchoResponse {
        text: String,
    }

    fn echo_registry() -> Arc<ServiceRegistry> {
        let mut registry = ServiceRegistry::new();
        registry
            .register(
                ServiceBuilder::new("EchoService")
                    .method("Echo", |req: EchoRequest, _: &mut RpcController| {
                        EchoResponse { text: req.text }
                    })
                    .build(),
            )
            .unwrap();
        registry.into_shared()
    }

    async fn start_server() -> (Arc<Server>, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Arc::new(Server::new(ServerConfig::new(addr), echo_registry()));

        let run = server.clone();
        tokio::spawn(async move {
            run.serve(listener).await.unwrap();
        });
        (server, addr)
    }

    async fn call_raw(addr: SocketAddr, request: &[u8]) -> ResponseEnvelope {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request).await.unwrap();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        let mut buf = BytesMut::from(&raw[..]);
        let frame = ResponseFrame::decode(&mut buf).unwrap().unwrap();
        serde_json::from_slice(&frame.payload).unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_round_trip_over_tcp() {
        let (server, addr) = start_server().await;

        let args = serde_json::to_vec(&EchoRequest { text: "ping".into() }).unwrap();
        let request = RequestFrame::encode("EchoService", "Echo", &args).unwrap();
        let envelope = call_raw(addr, &request).await;

        assert!(envelope.is_ok());
        let response: EchoResponse = serde_json::from_value(envelope.body.unwrap()).unwrap();
        assert_eq!(response.text, "ping");

        server.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_connections_get_their_own_responses() {
        let (server, addr) = start_server().await;

        let mut handles = Vec::new();
        for nonce in 0..16u32 {
            handles.push(tokio::spawn(async move {
                let text = format!("nonce-{nonce}");
                let args = serde_json::to_vec(&EchoRequest { text: text.clone() }).unwrap();
                let request = RequestFrame::encode("EchoService", "Echo", &args).unwrap();
                let envelope = call_raw(addr, &request).await;
                let response: EchoResponse =
                    serde_json::from_value(envelope.body.unwrap()).unwrap();
                assert_eq!(response.text, text);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = server.stats();
        assert!(stats.connections_total.load(Ordering::Relaxed) >= 16);
        server.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_service_gets_structured_error() {
        let (server, addr) = start_server().await;

        let request = RequestFrame::encode("MissingService", "Echo", b"{}").unwrap();
        let envelope = call_raw(addr, &request).await;

        assert!(!envelope.is_ok());
        assert_eq!(
            envelope.error.unwrap().code,
            minrpc_protocol::ErrorCode::ServiceNotFound
        );
        server.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_requests_counted_only_when_a_frame_decodes() {
        let (server, addr) = start_server().await;

        // Connect and leave without sending anything
        let empty = TcpStream::connect(addr).await.unwrap();
        drop(empty);

        let args = serde_json::to_vec(&EchoRequest { text: "one".into() }).unwrap();
        let request = RequestFrame::encode("EchoService", "Echo", &args).unwrap();
        call_raw(addr, &request).await;

        // Session tasks update counters after responding
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let stats = server.stats();
        assert_eq!(stats.requests_total.load(Ordering::Relaxed), 1);
        assert!(stats.connections_total.load(Ordering::Relaxed) >= 2);
        server.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_connection_limit_rejects_new_connections() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = ServerConfig::new(addr).with_max_connections(0);
        let server = Arc::new(Server::new(config, echo_registry()));

        let run = server.clone();
        tokio::spawn(async move {
            run.serve(listener).await.unwrap();
        });

        // A rejected connection is closed without a response
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let mut buf = [0u8; 1];
        let n = stream.read(&mut buf).await.unwrap();
        assert_eq!(n, 0);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let stats = server.stats();
        assert_eq!(stats.connections_total.load(Ordering::Relaxed), 0);
        assert!(stats.errors_total.load(Ordering::Relaxed) >= 1);
        server.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shutdown_stops_accept_loop() {
        let (server, _addr) = start_server().await;

        // Give the accept loop a moment to start
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(server.is_running());

        server.shutdown();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!server.is_running());
    }
}
