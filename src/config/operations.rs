//! Config loading, validation, and derived settings.

use super::model::Config;
use crate::error::{Error, Result};
use crate::lock::{LockManager, LockStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(Error::Config)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load config from a YAML file, falling back to defaults when the file
    /// does not exist. A file that exists but is invalid is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match std::fs::metadata(path.as_ref()) {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            _ => Self::load(path),
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `lock_path`, `api_base_url` and `token_env` must be non-empty
    /// - every timeout and interval must be positive
    /// - the heartbeat must fire before the lock would go stale
    pub fn validate(&self) -> Result<()> {
        let non_empty = [
            ("lock_path", &self.lock_path),
            ("api_base_url", &self.api_base_url),
            ("token_env", &self.token_env),
        ];
        for (name, value) in non_empty {
            if value.trim().is_empty() {
                return Err(Error::Config(format!(
                    "config validation failed: {} must not be empty",
                    name
                )));
            }
        }

        let positive = [
            ("stale_threshold_secs", self.stale_threshold_secs),
            ("heartbeat_interval_secs", self.heartbeat_interval_secs),
            ("store_timeout_ms", self.store_timeout_ms),
            ("remote_timeout_secs", self.remote_timeout_secs),
            ("max_drain_batches", u64::from(self.max_drain_batches)),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Error::Config(format!(
                    "config validation failed: {} must be greater than 0",
                    name
                )));
            }
        }

        if self.heartbeat_interval_secs >= self.stale_threshold_secs {
            return Err(Error::Config(format!(
                "config validation failed: heartbeat_interval_secs ({}) must be less than stale_threshold_secs ({})",
                self.heartbeat_interval_secs, self.stale_threshold_secs
            )));
        }

        Ok(())
    }

    pub fn lock_path(&self) -> PathBuf {
        PathBuf::from(&self.lock_path)
    }

    pub fn stale_threshold(&self) -> Duration {
        Duration::from_secs(self.stale_threshold_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    /// Read the bot token from the configured environment variable.
    ///
    /// Blank values count as missing.
    pub fn credential(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Build the lock store for this deployment.
    pub fn lock_store(&self) -> LockStore {
        LockStore::new(self.lock_path(), self.store_timeout())
    }

    /// Build a lock manager using the wall clock.
    pub fn lock_manager(&self) -> LockManager {
        LockManager::new(self.lock_store(), self.stale_threshold())
    }
}
