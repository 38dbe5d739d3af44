//! minrpc demo provider.
//!
//! Publishes the example `UserService` over TCP using the address from the
//! process configuration.

use clap::Parser;
use minrpc::demo;
use minrpc::{Config, Server, ServerConfig, ServiceRegistry};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "minrpc-demo", about = "Run the minrpc demo user service")]
struct Args {
    /// Path to the YAML config file (falls back to MINRPC_CONFIG, then
    /// defaults plus environment overrides).
    #[arg(short = 'i', long, env = "MINRPC_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Config errors at startup are fatal for the process.
    let config = match args.config {
        Some(path) => {
            let config = Config::from_file(&path)?;
            tracing::info!(path = %path.display(), "loaded config");
            config
        }
        None => Config::load()?,
    };

    let bind_addr = config.server_addr()?;
    tracing::info!("starting minrpc demo provider");
    tracing::info!("  bind address: {bind_addr}");
    tracing::info!("  max connections: {}", config.network.max_connections);

    // All registration happens before the server starts accepting.
    let mut registry = ServiceRegistry::new();
    registry.register(demo::user_service())?;

    let server_config =
        ServerConfig::new(bind_addr).with_max_connections(config.network.max_connections);
    let server = Server::new(server_config, registry.into_shared());

    server.run().await?;
    Ok(())
}
