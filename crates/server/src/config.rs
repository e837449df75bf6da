//! Server configuration.
//!
//! Precedence, lowest to highest: built-in defaults, an optional
//! `plaza.toml` next to the binary, then environment variables:
//!
//! - `PLAZA_BIND_ADDR`       (default: "0.0.0.0")
//! - `PLAZA_PORT`            (default: 7410)
//! - `PLAZA_MAX_CONNECTIONS` (default: 256)
//! - `PLAZA_DB_PATH`         (default: platform data dir)

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Config file read when no explicit path is given.
const DEFAULT_CONFIG_FILE: &str = "plaza.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    Env { key: &'static str, value: String },

    #[error("invalid listen address: {0}")]
    Addr(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Interface to bind to.
    pub bind_addr: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Cap on simultaneously connected clients.
    pub max_connections: usize,

    /// SQLite database path; resolved under the platform data directory
    /// when unset.
    pub db_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: plaza_net::DEFAULT_PORT,
            max_connections: plaza_net::DEFAULT_MAX_CONNECTIONS,
            db_path: None,
        }
    }
}

impl Config {
    /// Load configuration: file (if present), then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = env::var("PLAZA_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("PLAZA_PORT") {
            self.port = value.parse().map_err(|_| ConfigError::Env {
                key: "PLAZA_PORT",
                value,
            })?;
        }
        if let Ok(value) = env::var("PLAZA_MAX_CONNECTIONS") {
            self.max_connections = value.parse().map_err(|_| ConfigError::Env {
                key: "PLAZA_MAX_CONNECTIONS",
                value,
            })?;
        }
        if let Ok(value) = env::var("PLAZA_DB_PATH") {
            self.db_path = Some(PathBuf::from(value));
        }
        Ok(())
    }

    /// Socket address to listen on.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .map_err(|_| ConfigError::Addr(format!("{}:{}", self.bind_addr, self.port)))
    }

    /// Database path, falling back to the platform data directory.
    pub fn resolve_db_path(&self) -> PathBuf {
        if let Some(path) = &self.db_path {
            return path.clone();
        }
        directories::ProjectDirs::from("", "", "plaza-world")
            .map(|dirs| dirs.data_dir().join("plaza_world.db"))
            .unwrap_or_else(|| PathBuf::from("plaza_world.db"))
    }
}
