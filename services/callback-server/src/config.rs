//! Configuration types and loading
//!
//! Config precedence: `--config` CLI arg > `CONFIG_PATH` env var >
//! `mpesa-callback-server.toml` in the working directory.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "mpesa-callback-server.toml";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Largest accepted callback body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Oldest records are dropped past this many
    #[serde(default = "default_max_stored")]
    pub max_stored: usize,
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_max_connections() -> usize {
    1000
}

fn default_max_stored() -> usize {
    1000
}

impl Config {
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> common::Result<Self> {
        let config: Config = toml::from_str(contents)?;

        if config.server.max_body_bytes == 0 {
            return Err(common::Error::Config(
                "max_body_bytes must be greater than 0".into(),
            ));
        }
        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }
        if config.server.max_stored == 0 {
            return Err(common::Error::Config(
                "max_stored must be greater than 0".into(),
            ));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }
}
