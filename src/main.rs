//! Stowage Server - Entry Point
//!
//! A browser-accessible file manager confined to a sandboxed storage
//! root, with a persisted chat log and disk-usage reporting.

use log::info;

use stowage_server::Server;
use stowage_server::config::ServerConfig;

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching Stowage file server...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => panic!("Failed to load configuration: {}", e),
    };

    let server = Server::new(config).await;
    server.start().await;
}
