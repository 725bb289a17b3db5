//! Optional user configuration at `~/.tether/config.yaml`.
//!
//! Every field has a default taken from [`crate::paths`]; a missing file is
//! simply the default configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{io_err, CoreError};
use crate::paths;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Loopback port each tgit daemon binds on its own endpoint.
    pub daemon_bind_port: u16,
    /// Forwarded port through which the peer's daemon is reached.
    pub daemon_connect_port: u16,
    /// Quiet period, in milliseconds, before pending endpoints are flushed.
    pub debounce_ms: u64,
    /// Event wait, in seconds, when no endpoint is pending.
    pub idle_wait_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            daemon_bind_port: paths::DAEMON_BIND_PORT,
            daemon_connect_port: paths::DAEMON_CONNECT_PORT,
            debounce_ms: paths::DEBOUNCE_WINDOW.as_millis() as u64,
            idle_wait_secs: paths::IDLE_WAIT.as_secs(),
        }
    }
}

impl SyncConfig {
    /// Load from the default home directory.
    pub fn load() -> Result<Self, CoreError> {
        let home = dirs::home_dir().ok_or(CoreError::HomeNotFound)?;
        Self::load_at(&home)
    }

    /// Load from `<home>/.tether/config.yaml`; a missing file yields the
    /// defaults.
    pub fn load_at(home: &Path) -> Result<Self, CoreError> {
        let path = paths::config_path(home);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let config: Self =
            serde_yaml::from_str(&contents).map_err(|e| CoreError::ConfigParse {
                path: path.clone(),
                source: e,
            })?;
        debug!(path = %path.display(), "loaded sync config");
        Ok(config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn idle_wait(&self) -> Duration {
        Duration::from_secs(self.idle_wait_secs)
    }
}
