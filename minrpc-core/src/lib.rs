//! # minrpc-core
//!
//! Dispatch core for minrpc.
//!
//! This crate provides:
//! - The service registry mapping `(service, method)` names to invokable
//!   method handles
//! - Type-erased method handles built from typed business closures
//! - The per-call controller carrying failure and cancellation status
//!
//! The registry is built once at startup and is read-only afterwards, so
//! lookups during request handling need no locking.

pub mod controller;
pub mod error;
pub mod registry;

pub use controller::RpcController;
pub use error::DispatchError;
pub use registry::{MethodHandle, ServiceBuilder, ServiceDescriptor, ServiceRegistry};
