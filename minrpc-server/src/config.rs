//! Process configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via `MINRPC_CONFIG` or `--config`)
//! 3. Environment variables
//!
//! Both the provider and the client demo read the same `rpc` section to
//! learn the bind/connect address. A missing key or a value of the wrong
//! type is a fatal startup error, never a runtime error.

use minrpc_protocol::DEFAULT_PORT;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration load errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    IoError(PathBuf, std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),

    #[error("invalid rpc address {0}")]
    InvalidAddr(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// RPC endpoint configuration, shared by server and client.
    pub rpc: RpcConfig,
    /// Network tuning for the provider.
    pub network: NetworkConfig,
}

impl Config {
    /// Loads configuration from file (if `MINRPC_CONFIG` is set), then
    /// applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("MINRPC_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        self.rpc.apply_env_overrides();
        self.network.apply_env_overrides();
    }

    /// Returns the address the provider binds and clients connect to.
    pub fn server_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.rpc.server_ip, self.rpc.server_port);
        addr.parse().map_err(|_| ConfigError::InvalidAddr(addr))
    }
}

/// RPC endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Host the server binds to and clients connect to.
    pub server_ip: String,
    /// Port the server listens on.
    pub server_port: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            server_ip: "127.0.0.1".to_string(),
            server_port: DEFAULT_PORT,
        }
    }
}

impl RpcConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(ip) = std::env::var("MINRPC_SERVER_IP") {
            self.server_ip = ip;
        }

        if let Ok(port) = std::env::var("MINRPC_SERVER_PORT") {
            if let Ok(parsed) = port.parse() {
                self.server_port = parsed;
            }
        }
    }
}

/// Network tuning for the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Maximum concurrent connections.
    pub max_connections: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
        }
    }
}

impl NetworkConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(max) = std::env::var("MINRPC_MAX_CONNECTIONS") {
            if let Ok(n) = max.parse() {
                self.max_connections = n;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.rpc.server_ip, "127.0.0.1");
        assert_eq!(config.rpc.server_port, DEFAULT_PORT);
        assert_eq!(config.network.max_connections, 1000);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "rpc:\n  server_ip: 10.0.0.5\n  server_port: 9000\nnetwork:\n  max_connections: 64"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.rpc.server_ip, "10.0.0.5");
        assert_eq!(config.rpc.server_port, 9000);
        assert_eq!(config.network.max_connections, 64);
        assert_eq!(
            config.server_addr().unwrap(),
            "10.0.0.5:9000".parse().unwrap()
        );
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rpc:\n  server_port: 8123").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.rpc.server_ip, "127.0.0.1");
        assert_eq!(config.rpc.server_port, 8123);
    }

    // Environment variables are process-global, so everything env-driven
    // lives in this one test; the other tests go through from_file only.
    #[test]
    fn test_env_overrides_win_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "rpc:\n  server_ip: 10.0.0.5\n  server_port: 9000\nnetwork:\n  max_connections: 64"
        )
        .unwrap();

        std::env::set_var("MINRPC_CONFIG", file.path());
        std::env::set_var("MINRPC_SERVER_PORT", "9100");
        std::env::set_var("MINRPC_MAX_CONNECTIONS", "7");
        // Unparseable values are ignored, keeping the earlier layer
        std::env::set_var("MINRPC_SERVER_IP", "10.9.9.9");

        let loaded = Config::load();

        std::env::remove_var("MINRPC_CONFIG");
        std::env::remove_var("MINRPC_SERVER_PORT");
        std::env::remove_var("MINRPC_MAX_CONNECTIONS");
        std::env::remove_var("MINRPC_SERVER_IP");

        let config = loaded.unwrap();
        // env beats file where set
        assert_eq!(config.rpc.server_ip, "10.9.9.9");
        assert_eq!(config.rpc.server_port, 9100);
        assert_eq!(config.network.max_connections, 7);
    }

    #[test]
    fn test_from_env_ignores_unparseable_port() {
        std::env::set_var("MINRPC_SERVER_PORT", "not-a-port");
        let config = Config::from_env();
        std::env::remove_var("MINRPC_SERVER_PORT");

        assert_eq!(config.rpc.server_port, DEFAULT_PORT);
    }

    #[test]
    fn test_bad_yaml_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rpc: [not, a, mapping").unwrap();

        let result = Config::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_, _))));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = Config::from_file("/nonexistent/minrpc.yaml");
        assert!(matches!(result, Err(ConfigError::IoError(_, _))));
    }

    #[test]
    fn test_invalid_addr() {
        let mut config = Config::default();
        config.rpc.server_ip = "not an ip".to_string();
        assert!(matches!(
            config.server_addr(),
            Err(ConfigError::InvalidAddr(_))
        ));
    }
}
