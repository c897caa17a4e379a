//! Config loading, validation, and utility operations.

use super::model::{Config, MAX_RETRY_DELAY_MS};
use crate::error::{LockError, Result};
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(LockError::Io)` - The file could not be read
    /// * `Err(LockError::InvalidArgument)` - Parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|e| LockError::io("read config file", path, e))?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml).map_err(|e| {
            LockError::InvalidArgument(format!("failed to parse config YAML: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            LockError::InvalidArgument(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `timeout_ms` must be positive
    /// - `retry_delay_ms` must stay below one second
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(LockError::InvalidArgument(
                "config validation failed: timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.retry_delay_ms >= MAX_RETRY_DELAY_MS {
            return Err(LockError::InvalidArgument(format!(
                "config validation failed: retry_delay_ms must be less than {} (found {})",
                MAX_RETRY_DELAY_MS, self.retry_delay_ms
            )));
        }

        Ok(())
    }

    /// The acquire deadline as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The post-wake-up back-off as a duration.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Copy of this config with a different deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX).max(1);
        self
    }
}
