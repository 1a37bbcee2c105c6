//! Configuration management
//!
//! Startup configuration for the file server, loaded once from
//! config.toml with environment overrides under the STOWAGE prefix.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration. All values are fixed at startup; the storage
/// root is never re-resolved per request.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address to bind the HTTP listener
    pub bind_address: String,

    /// HTTP port
    pub port: u16,

    /// Root directory all client file operations are confined to
    pub storage_root: String,

    /// Path of the persisted chat log
    pub chat_log: String,
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    /// (e.g. STOWAGE_PORT=9090).
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config"))
            .add_source(Environment::with_prefix("STOWAGE"))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Get bind address and port as a socket address string
    pub fn socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    pub fn chat_log_path(&self) -> PathBuf {
        PathBuf::from(&self.chat_log)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.bind_address.is_empty() {
            return Err(ConfigError::Message("bind_address cannot be empty".into()));
        }

        if self.storage_root.is_empty() {
            return Err(ConfigError::Message("storage_root cannot be empty".into()));
        }

        if self.chat_log.is_empty() {
            return Err(ConfigError::Message("chat_log cannot be empty".into()));
        }

        Ok(())
    }
}
