//! Server core
//!
//! Builds shared state from configuration, binds the listener, and
//! serves the HTTP API.

use log::{error, info};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::chat::ChatLog;
use crate::config::ServerConfig;
use crate::server::routes;
use crate::storage::resolver::PathResolver;
use crate::usage::probe::{self, DiskProbe};

/// Shared per-request state: the resolver over the storage root, the
/// chat log, and the platform probe chain.
pub struct AppState {
    pub resolver: PathResolver,
    pub chat: ChatLog,
    pub probes: Vec<Box<dyn DiskProbe>>,
}

pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl Server {
    /// Prepare the storage root, build shared state, and bind the
    /// listener. Panics on failure; nothing can be served without
    /// either.
    pub async fn new(config: ServerConfig) -> Self {
        let root = config.storage_root_path();
        if let Err(e) = std::fs::create_dir_all(&root) {
            panic!("Failed to create storage root {}: {}", root.display(), e);
        }

        let resolver = match PathResolver::new(&root) {
            Ok(resolver) => resolver,
            Err(e) => panic!("Failed to resolve storage root {}: {}", root.display(), e),
        };

        info!("Storage root: {}", resolver.root().display());

        let listener = match TcpListener::bind(config.socket()).await {
            Ok(listener) => {
                info!("Server bound to {}", config.socket());
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", config.socket(), e);
                panic!("Server startup failed on socket {}: {}", config.socket(), e);
            }
        };

        let state = Arc::new(AppState {
            resolver,
            chat: ChatLog::new(config.chat_log_path()),
            probes: probe::platform_probes(),
        });

        Self { listener, state }
    }

    /// Serve requests until the process is stopped.
    pub async fn start(self) {
        info!("Starting Stowage file server");

        let router = routes::router(self.state);
        if let Err(e) = axum::serve(self.listener, router).await {
            error!("Server terminated: {}", e);
        }
    }
}
