//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (TRIPSHELL_*)
//! 2. TOML config file (if TRIPSHELL_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::worker::{WorkerConfig, resolve};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (TRIPSHELL_*)
/// 2. TOML config file (if TRIPSHELL_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite database holding cache buckets and preferences.
    ///
    /// Set via TRIPSHELL_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Base URL the app is served from. Its origin decides what gets intercepted.
    ///
    /// Set via TRIPSHELL_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Versioned bucket name. Bump it whenever the manifest or asset bytes change.
    ///
    /// Set via TRIPSHELL_CACHE_NAME environment variable.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Paths pre-cached at install, relative to `origin`.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Document served to navigations when both cache and network miss.
    ///
    /// Set via TRIPSHELL_SHELL_PATH environment variable.
    #[serde(default = "default_shell_path")]
    pub shell_path: String,

    /// Body of the synthetic 503 for unreachable sub-resources.
    #[serde(default = "default_offline_text")]
    pub offline_text: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via TRIPSHELL_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via TRIPSHELL_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via TRIPSHELL_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Key prefix for the preference store.
    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./tripshell.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8080/".into()
}

fn default_cache_name() -> String {
    "beijing-trip-v2".into()
}

fn default_precache() -> Vec<String> {
    [
        "./",
        "./index.html",
        "./styles.css",
        "./features.css",
        "./app.js",
        "./data.js",
        "./manifest.json",
        "./icons/icon.svg",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_shell_path() -> String {
    "./index.html".into()
}

fn default_offline_text() -> String {
    "Offline".into()
}

fn default_user_agent() -> String {
    "tripshell/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_storage_prefix() -> String {
    "bj_".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_name: default_cache_name(),
            precache: default_precache(),
            shell_path: default_shell_path(),
            offline_text: default_offline_text(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            storage_prefix: default_storage_prefix(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `TRIPSHELL_`
    /// 2. TOML file from `TRIPSHELL_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment()
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("TRIPSHELL_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("TRIPSHELL_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Parsed application base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid { field: "origin".into(), reason: format!("unsupported scheme: {scheme}") }),
        }
    }

    /// Build the cache manager's settings, resolving every path against `origin`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin or any path fails to resolve.
    pub fn worker_config(&self) -> Result<WorkerConfig, ConfigError> {
        let origin = self.origin_url()?;
        let manifest = self
            .precache
            .iter()
            .map(|path| {
                resolve(&origin, path).map_err(|e| ConfigError::Invalid { field: "precache".into(), reason: e.to_string() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let shell = resolve(&origin, &self.shell_path)
            .map_err(|e| ConfigError::Invalid { field: "shell_path".into(), reason: e.to_string() })?;

        Ok(WorkerConfig {
            origin,
            cache_name: self.cache_name.clone(),
            manifest,
            shell,
            offline_text: self.offline_text.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./tripshell.sqlite"));
        assert_eq!(config.cache_name, "beijing-trip-v2");
        assert_eq!(config.precache.len(), 8);
        assert_eq!(config.precache[0], "./");
        assert_eq!(config.shell_path, "./index.html");
        assert_eq!(config.offline_text, "Offline");
        assert_eq!(config.user_agent, "tripshell/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.storage_prefix, "bj_");
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_worker_config_resolves_manifest() {
        let config = AppConfig { origin: "https://trip.example/beijing/".into(), ..Default::default() };
        let worker = config.worker_config().unwrap();
        assert_eq!(worker.manifest[0].as_str(), "https://trip.example/beijing/");
        assert_eq!(worker.manifest[1].as_str(), "https://trip.example/beijing/index.html");
        assert_eq!(worker.manifest[7].as_str(), "https://trip.example/beijing/icons/icon.svg");
        assert_eq!(worker.shell.as_str(), "https://trip.example/beijing/index.html");
    }

    #[test]
    fn test_origin_url_rejects_other_schemes() {
        let config = AppConfig { origin: "ftp://trip.example/".into(), ..Default::default() };
        assert!(matches!(config.origin_url(), Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_load_layers_env_over_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "tripshell.toml",
                r#"
                cache_name = "trip-v7"
                precache = ["./", "./index.html"]
                timeout_ms = 5000
                "#,
            )?;
            jail.set_env("TRIPSHELL_CONFIG_FILE", "tripshell.toml");
            jail.set_env("TRIPSHELL_TIMEOUT_MS", "7000");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.cache_name, "trip-v7");
            assert_eq!(config.precache, vec!["./".to_string(), "./index.html".to_string()]);
            assert_eq!(config.timeout_ms, 7000);
            assert_eq!(config.user_agent, "tripshell/0.1");
            Ok(())
        });
    }
}
