//! Configuration management for RAX File Share
//!
//! Settings are read from `config.toml` and may be overridden by environment
//! variables prefixed with `RAX_SHARE` (for example `RAX_SHARE_MAX_FILES=50`).

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    // ═══ NETWORK ═══
    /// IP address the command listener binds to
    pub bind_address: String,

    /// Port for the command listener
    pub port: u16,

    /// Maximum concurrent client sessions
    pub max_clients: usize,

    // ═══ STORAGE ═══
    /// Directory that holds file contents
    pub storage_root: String,

    /// Append-only audit log
    pub audit_log_path: String,

    /// Registry capacity
    pub max_files: usize,

    // ═══ PROTOCOL LIMITS ═══
    /// Largest file payload accepted or returned, in bytes
    pub max_content_size: usize,

    /// Largest request line, in bytes
    pub max_request_length: usize,

    /// Longest accepted user or group name
    pub max_identity_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 2121,
            max_clients: 10,
            storage_root: "./share_root".to_string(),
            audit_log_path: "./share_audit.log".to_string(),
            max_files: 100,
            max_content_size: 4096,
            max_request_length: 8192,
            max_identity_length: 64,
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        // Try the packaged path first, then the development path
        let config_paths = ["rax-file-share/config", "config"];

        let mut last_error = None;

        for config_path in &config_paths {
            match Config::builder()
                .add_source(File::with_name(config_path))
                .add_source(Environment::with_prefix("RAX_SHARE").try_parsing(true))
                .build()
            {
                Ok(settings) => {
                    let config: ServerConfig = settings.try_deserialize()?;
                    config.validate()?;
                    return Ok(config);
                }
                Err(e) => {
                    last_error = Some(e);
                    continue;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            config::ConfigError::Message(format!(
                "Failed to load config.toml from any of {config_paths:?}"
            ))
        }))
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.storage_root.is_empty() {
            return Err(config::ConfigError::Message(
                "storage_root cannot be empty".into(),
            ));
        }

        if self.audit_log_path.is_empty() {
            return Err(config::ConfigError::Message(
                "audit_log_path cannot be empty".into(),
            ));
        }

        let limits = [
            ("max_clients", self.max_clients),
            ("max_files", self.max_files),
            ("max_content_size", self.max_content_size),
            ("max_request_length", self.max_request_length),
            ("max_identity_length", self.max_identity_length),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(config::ConfigError::Message(format!(
                    "{name} must be greater than 0"
                )));
            }
        }

        Ok(())
    }

    /// Get bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get storage root as PathBuf
    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Get audit log location as PathBuf
    pub fn audit_log_file(&self) -> PathBuf {
        PathBuf::from(&self.audit_log_path)
    }
}
