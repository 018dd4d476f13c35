use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Port the server listens on unless configured otherwise.
pub const PORT: u16 = 39732;

/// How many pending connections the accept queue will hold.
pub const BACKLOG: u32 = 10;

/// Max number of bytes read for a request, and block size for responses.
pub const MAX_DATA_SIZE: usize = 4096;

/// Upper bound on waiting for the peer to close after a response.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Upper bound on concurrently running handlers.
pub const MAX_HANDLERS: usize = 1024;

/// Pause after a failed accept before trying again.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub backlog: u32,
    pub max_request_size: usize,
    pub drain_timeout_ms: u64,
    pub max_handlers: usize,
    pub accept_backoff_ms: u64,
    pub root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: format!("[::]:{}", PORT),
            backlog: BACKLOG,
            max_request_size: MAX_DATA_SIZE,
            drain_timeout_ms: DRAIN_TIMEOUT.as_millis() as u64,
            max_handlers: MAX_HANDLERS,
            accept_backoff_ms: ACCEPT_BACKOFF.as_millis() as u64,
            root: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Loads configuration from `COURIER_CONFIG` (a YAML file) if set,
    /// then applies the `LISTEN` override.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var("COURIER_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.listen_addr = listen_addr;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(text).context("Failed to parse YAML config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.backlog == 0 {
            anyhow::bail!("backlog must be greater than zero");
        }
        if self.max_handlers == 0 {
            anyhow::bail!("max_handlers must be greater than zero");
        }
        if self.accept_backoff_ms == 0 {
            anyhow::bail!("accept_backoff_ms must be greater than zero");
        }
        // "GET /" plus at least one path byte and a terminating space
        if self.max_request_size <= 5 {
            anyhow::bail!("max_request_size must be greater than 5 bytes");
        }
        Ok(())
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    pub fn accept_backoff(&self) -> Duration {
        Duration::from_millis(self.accept_backoff_ms)
    }
}
