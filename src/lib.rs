//! # minrpc
//!
//! A minimal unary RPC framework over TCP.
//!
//! A locally implemented service becomes network-reachable by registering
//! its methods in a [`ServiceRegistry`] and handing the registry to a
//! [`Server`]; a remote caller invokes those methods through a [`Channel`]
//! as if they were local. One request/response exchange per connection,
//! plain byte streams, no discovery or streaming.
//!
//! ```no_run
//! use minrpc::{Channel, ChannelConfig, RpcController};
//! use minrpc::demo::{LoginRequest, LoginResponse};
//!
//! let channel = Channel::new(ChannelConfig::new("127.0.0.1:7801".parse().unwrap()));
//! let mut controller = RpcController::new();
//! let request = LoginRequest {
//!     username: "zhang san".into(),
//!     password: "123456".into(),
//! };
//! let response: LoginResponse =
//!     channel.call("UserService", "Login", &request, &mut controller);
//! if controller.failed() {
//!     eprintln!("login rpc failed: {}", controller.error_text());
//! } else {
//!     println!("login success: {}", response.success);
//! }
//! ```

pub use minrpc_client::{Channel, ChannelConfig, ChannelError};
pub use minrpc_core::{
    DispatchError, MethodHandle, RpcController, ServiceBuilder, ServiceDescriptor, ServiceRegistry,
};
pub use minrpc_protocol::{
    ErrorCode, ProtocolError, RequestFrame, RequestHeader, ResponseEnvelope, ResponseFrame,
    RpcMessage, DEFAULT_PORT, MAX_FRAME_SIZE,
};
pub use minrpc_server::{Config, ConfigError, Server, ServerConfig, ServerError};

pub mod demo;
