//! Example user service published through the framework.
//!
//! Business logic here stands in for a real application; it exists so the
//! demo binary and the end-to-end tests have something to call.

use minrpc_core::{RpcController, ServiceBuilder, ServiceDescriptor};
use serde::{Deserialize, Serialize};

/// Error code and message pair nested in every demo response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultCode {
    pub errcode: i32,
    pub errmsg: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub result: ResultCode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub id: u32,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub result: ResultCode,
}

/// The local business logic behind the published service.
fn login(username: &str, password: &str) -> bool {
    tracing::info!(%username, "local Login called");
    !username.is_empty() && !password.is_empty()
}

fn register(id: u32, username: &str, _password: &str) -> bool {
    tracing::info!(id, %username, "local Register called");
    !username.is_empty()
}

/// Builds the `UserService` descriptor with its `Login` and `Register`
/// methods.
pub fn user_service() -> ServiceDescriptor {
    ServiceBuilder::new("UserService")
        .method("Login", |req: LoginRequest, _ctrl: &mut RpcController| {
            let success = login(&req.username, &req.password);
            LoginResponse {
                success,
                result: ResultCode {
                    errcode: 0,
                    errmsg: String::new(),
                },
            }
        })
        .method(
            "Register",
            |req: RegisterRequest, _ctrl: &mut RpcController| {
                let success = register(req.id, &req.username, &req.password);
                RegisterResponse {
                    success,
                    result: ResultCode {
                        errcode: 0,
                        errmsg: String::new(),
                    },
                }
            },
        )
        .build()
}
