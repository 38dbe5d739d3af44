//! Service registry and type-erased method handles.
//!
//! Generic dispatch works without compile-time knowledge of the call site:
//! each registered method is stored as a handle whose invocation closure
//! takes the raw argument payload, decodes it into the typed request
//! (produced via the message type's `Default` factory), runs the business
//! closure, and serializes the typed response back out. The server only
//! ever sees bytes in and a serialized body out.

use crate::controller::RpcController;
use crate::error::DispatchError;
use minrpc_protocol::RpcMessage;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Type-erased invocation function: argument payload in, serialized
/// response body out, controller threaded through.
type InvokeFn =
    Box<dyn Fn(&[u8], &mut RpcController) -> Result<Value, DispatchError> + Send + Sync>;

/// The registry's executable binding for one `(service, method)` pair.
///
/// Stateless once built; safe to share across concurrent calls.
pub struct MethodHandle {
    name: String,
    invoke: InvokeFn,
}

impl MethodHandle {
    /// Returns the method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the method: decodes `args` into the typed request, runs the
    /// handler, and returns the serialized response body.
    pub fn invoke(
        &self,
        args: &[u8],
        controller: &mut RpcController,
    ) -> Result<Value, DispatchError> {
        (self.invoke)(args, controller)
    }
}

impl std::fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodHandle").field("name", &self.name).finish()
    }
}

/// One registered service: a name plus its method table.
#[derive(Debug)]
pub struct ServiceDescriptor {
    name: String,
    methods: HashMap<String, MethodHandle>,
}

impl ServiceDescriptor {
    /// Returns the service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the registered method names.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Looks up a method handle by name.
    pub fn method(&self, name: &str) -> Option<&MethodHandle> {
        self.methods.get(name)
    }
}

/// Builder assembling a [`ServiceDescriptor`] from typed method closures.
///
/// The business closure receives the decoded request and the per-call
/// controller, and returns the typed response. Handlers for stateful
/// services capture an `Arc` of the service instance; the framework may
/// invoke them concurrently for different connections, so the service
/// implementation is responsible for its own synchronization.
///
/// ```
/// use minrpc_core::{RpcController, ServiceBuilder};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, Serialize, Deserialize)]
/// struct EchoRequest { text: String }
/// #[derive(Default, Serialize, Deserialize)]
/// struct EchoResponse { text: String }
///
/// let service = ServiceBuilder::new("EchoService")
///     .method("Echo", |req: EchoRequest, _ctrl: &mut RpcController| {
///         EchoResponse { text: req.text }
///     })
///     .build();
/// assert_eq!(service.name(), "EchoService");
/// ```
pub struct ServiceBuilder {
    name: String,
    methods: HashMap<String, MethodHandle>,
}

impl ServiceBuilder {
    /// Starts a builder for a service with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
        }
    }

    /// Registers a method under `name`.
    ///
    /// A method registered twice under the same name replaces the earlier
    /// handle; method names are unique within a service.
    pub fn method<Req, Resp, F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        Req: RpcMessage,
        Resp: RpcMessage,
        F: Fn(Req, &mut RpcController) -> Resp + Send + Sync + 'static,
    {
        let name = name.into();
        let invoke: InvokeFn = Box::new(move |args, controller| {
            let request = Req::from_payload(args)
                .map_err(|e| DispatchError::ArgumentDecode(e.to_string()))?;
            let response = handler(request, controller);
            serde_json::to_value(&response)
                .map_err(|e| DispatchError::Serialization(e.to_string()))
        });

        self.methods.insert(
            name.clone(),
            MethodHandle { name, invoke },
        );
        self
    }

    /// Finalizes the descriptor.
    pub fn build(self) -> ServiceDescriptor {
        ServiceDescriptor {
            name: self.name,
            methods: self.methods,
        }
    }
}

/// Process-wide table of registered services.
///
/// Registration happens during startup, before the server accepts
/// connections. After that the registry is wrapped in an `Arc` and only
/// read, so resolution takes no locks.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, ServiceDescriptor>,
}

impl ServiceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service descriptor.
    ///
    /// Fails loudly if a service with the same name is already registered.
    pub fn register(&mut self, service: ServiceDescriptor) -> Result<(), DispatchError> {
        let name = service.name().to_string();
        if self.services.contains_key(&name) {
            return Err(DispatchError::DuplicateService(name));
        }
        tracing::info!(
            service = %name,
            methods = service.methods.len(),
            "registered service"
        );
        self.services.insert(name, service);
        Ok(())
    }

    /// Resolves a `(service, method)` pair to its handle.
    pub fn resolve(&self, service: &str, method: &str) -> Result<&MethodHandle, DispatchError> {
        let descriptor = self
            .services
            .get(service)
            .ok_or_else(|| DispatchError::ServiceNotFound(service.to_string()))?;
        descriptor
            .method(method)
            .ok_or_else(|| DispatchError::MethodNotFound {
                service: service.to_string(),
                method: method.to_string(),
            })
    }

    /// Resolves and invokes in one step.
    pub fn dispatch(
        &self,
        service: &str,
        method: &str,
        args: &[u8],
        controller: &mut RpcController,
    ) -> Result<Value, DispatchError> {
        let handle = self.resolve(service, method)?;
        handle.invoke(args, controller)
    }

    /// Returns the names of all registered services.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// Returns the number of registered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Finishes registration, producing the shared read-only registry the
    /// server dispatches against.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
