//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) URL, or a manifest path escapes it
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` or `storage_prefix` is empty
    ///
    /// Returns `ConfigError::Missing` if `cache_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_name".into(),
                hint: "Set TRIPSHELL_CACHE_NAME to a versioned bucket name, e.g. trip-v1".into(),
            });
        }

        let worker = self.worker_config()?;
        let origin = worker.origin.origin();
        for (path, url) in self.precache.iter().zip(&worker.manifest) {
            if url.origin() != origin {
                return Err(ConfigError::Invalid {
                    field: "precache".into(),
                    reason: format!("{path} is not same-origin with {}", self.origin),
                });
            }
        }
        if worker.shell.origin() != origin {
            return Err(ConfigError::Invalid {
                field: "shell_path".into(),
                reason: format!("{} is not same-origin with {}", self.shell_path, self.origin),
            });
        }
        if !worker.manifest.contains(&worker.shell) {
            tracing::warn!(
                shell_path = %self.shell_path,
                "shell_path is not pre-cached; offline navigations will only find it after a first visit"
            );
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }
        if self.storage_prefix.is_empty() {
            return Err(ConfigError::Invalid { field: "storage_prefix".into(), reason: "must not be empty".into() });
        }

        Ok(())
    }
}
