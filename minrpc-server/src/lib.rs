//! # minrpc-server
//!
//! TCP provider for minrpc.
//!
//! This crate provides:
//! - An async TCP accept loop over the shared tokio runtime
//! - Per-connection sessions handling one request/response exchange
//! - Request dispatch against a read-only service registry
//! - YAML + environment configuration loading

pub mod config;
pub mod error;
pub mod server;
pub mod session;

pub use config::{Config, ConfigError, NetworkConfig, RpcConfig};
pub use error::ServerError;
pub use server::{Server, ServerConfig, ServerStats};
pub use session::{Session, SessionState};
