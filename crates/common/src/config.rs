//! Client configuration types and loading
//!
//! Non-secret settings come from a TOML file. The consumer key and secret
//! are loaded from `MPESA_CONSUMER_KEY` / `MPESA_CONSUMER_SECRET` or from
//! the files named by `consumer_key_file` / `consumer_secret_file`, never
//! from the TOML body itself. Env vars take precedence over files.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::secret::Secret;

pub const CONSUMER_KEY_ENV: &str = "MPESA_CONSUMER_KEY";
pub const CONSUMER_SECRET_ENV: &str = "MPESA_CONSUMER_SECRET";

/// Root client configuration
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub environment: Environment,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub consumer_key_file: Option<PathBuf>,
    #[serde(default)]
    pub consumer_secret_file: Option<PathBuf>,
    #[serde(skip)]
    pub consumer_key: Option<Secret<String>>,
    #[serde(skip)]
    pub consumer_secret: Option<Secret<String>>,
}

/// Transport retry settings (timeouts and connection failures only)
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            wait_secs: default_wait_secs(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_wait_secs() -> u64 {
    2
}

impl ClientConfig {
    /// Load configuration from a TOML file, then resolve consumer credentials.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&contents)?;
        config.resolve_credentials()?;
        debug!(
            path = %path.display(),
            environment = %config.environment,
            "client configuration loaded"
        );
        Ok(config)
    }

    /// Parse and validate the TOML body without touching credentials.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(contents)?;

        if config.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be greater than 0".into()));
        }
        if config.retry.max_attempts == 0 {
            return Err(Error::Config(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        Ok(config)
    }

    /// Resolve the consumer key and secret: env var first, then file.
    ///
    /// Both must end up non-blank; a missing pair is a configuration error
    /// rather than something discovered on the first token request.
    pub fn resolve_credentials(&mut self) -> Result<()> {
        self.consumer_key = Some(resolve_secret(
            CONSUMER_KEY_ENV,
            self.consumer_key_file.as_deref(),
            "consumer_key",
        )?);
        self.consumer_secret = Some(resolve_secret(
            CONSUMER_SECRET_ENV,
            self.consumer_secret_file.as_deref(),
            "consumer_secret",
        )?);
        Ok(())
    }
}

fn resolve_secret(env_var: &str, file: Option<&Path>, name: &str) -> Result<Secret<String>> {
    if let Ok(value) = std::env::var(env_var) {
        let secret = Secret::new(value.trim().to_owned());
        if !secret.is_blank() {
            return Ok(secret);
        }
    }

    if let Some(path) = file {
        let value = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {name} file {}: {e}", path.display()))
        })?;
        let secret = Secret::new(value.trim().to_owned());
        if !secret.is_blank() {
            return Ok(secret);
        }
    }

    Err(Error::Config(format!(
        "{name} is required: set {env_var} or {name}_file"
    )))
}
