//! Configuration management for Turnstile
//!
//! Values come from an optional YAML file, then `TURNSTILE_*` environment
//! variables (`__` separates nesting levels, e.g. `TURNSTILE_LOCK__TIMEOUT_SECS`),
//! then explicit overrides.

use std::time::Duration;

use config::{Config, Environment};

use turnstile_common::{DEFAULT_LOCK_TIMEOUT, DEFAULT_RETRY_INTERVAL, Result, TurnstileError};

use crate::lock::LockOptions;

/// Config file looked up when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "conf/turnstile";

pub const MEMCACHED_ADDRESS: &str = "memcached.address";
pub const MEMCACHED_POOL_SIZE: &str = "memcached.pool_size";
pub const MEMCACHED_CONNECT_TIMEOUT_MS: &str = "memcached.connect_timeout_ms";
pub const LOCK_TIMEOUT_SECS: &str = "lock.timeout_secs";
pub const LOCK_RETRY_INTERVAL_MS: &str = "lock.retry_interval_ms";
pub const LOG_LEVEL: &str = "log.level";

pub const DEFAULT_MEMCACHED_ADDRESS: &str = "127.0.0.1:11211";
pub const DEFAULT_MEMCACHED_POOL_SIZE: usize = 10;
pub const DEFAULT_MEMCACHED_CONNECT_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    /// Load configuration
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load<I>(path: Option<&str>, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let file = match path {
            Some(path) => config::File::with_name(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let mut builder = Config::builder().add_source(file).add_source(
            Environment::with_prefix("TURNSTILE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        for (key, value) in overrides {
            builder = builder
                .set_override(key, value)
                .map_err(|e| TurnstileError::Config(e.to_string()))?;
        }

        let config = builder
            .build()
            .map_err(|e| TurnstileError::Config(e.to_string()))?;
        Ok(Self::from_config(config))
    }

    /// Create a new configuration from a Config instance
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    // ===================== Memcached Configuration =====================

    pub fn memcached_address(&self) -> String {
        self.config
            .get_string(MEMCACHED_ADDRESS)
            .unwrap_or_else(|_| DEFAULT_MEMCACHED_ADDRESS.to_string())
    }

    /// Get memcached pool size (default: 10)
    pub fn memcached_pool_size(&self) -> usize {
        self.unsigned(MEMCACHED_POOL_SIZE)
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_MEMCACHED_POOL_SIZE)
    }

    /// Get memcached connect timeout (default: 1000ms)
    pub fn memcached_connect_timeout(&self) -> Duration {
        Duration::from_millis(
            self.unsigned(MEMCACHED_CONNECT_TIMEOUT_MS)
                .unwrap_or(DEFAULT_MEMCACHED_CONNECT_TIMEOUT_MS),
        )
    }

    // ===================== Lock Configuration =====================

    /// Get lock record TTL (default: 60s)
    pub fn lock_timeout(&self) -> Duration {
        self.unsigned(LOCK_TIMEOUT_SECS)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_LOCK_TIMEOUT)
    }

    /// Get poll interval (default: 10ms)
    pub fn lock_retry_interval(&self) -> Duration {
        self.unsigned(LOCK_RETRY_INTERVAL_MS)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_RETRY_INTERVAL)
    }

    pub fn lock_options(&self) -> LockOptions {
        LockOptions::default()
            .with_timeout(self.lock_timeout())
            .with_retry_interval(self.lock_retry_interval())
    }

    pub fn log_level(&self) -> String {
        self.config
            .get_string(LOG_LEVEL)
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
    }

    fn unsigned(&self, key: &str) -> Option<u64> {
        self.config
            .get_int(key)
            .ok()
            .and_then(|v| u64::try_from(v).ok())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Configuration::default();

        assert_eq!(config.memcached_address(), "127.0.0.1:11211");
        assert_eq!(config.memcached_pool_size(), 10);
        assert_eq!(config.memcached_connect_timeout(), Duration::from_millis(1000));
        assert_eq!(config.lock_options(), LockOptions::default());
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(
            file,
            "memcached:\n  address: cache.internal:11212\n  pool_size: 4\nlock:\n  timeout_secs: 30\n  retry_interval_ms: 25"
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = Configuration::load(Some(&path), Vec::new()).unwrap();

        assert_eq!(config.memcached_address(), "cache.internal:11212");
        assert_eq!(config.memcached_pool_size(), 4);
        assert_eq!(config.lock_timeout(), Duration::from_secs(30));
        assert_eq!(config.lock_retry_interval(), Duration::from_millis(25));
    }

    #[test]
    fn test_overrides_win() {
        let config = Configuration::load(
            None,
            vec![(MEMCACHED_ADDRESS.to_string(), "10.0.0.5:11211".to_string())],
        )
        .unwrap();

        assert_eq!(config.memcached_address(), "10.0.0.5:11211");
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Configuration::load(Some("/nonexistent/turnstile.yml"), Vec::new()).unwrap_err();
        assert!(matches!(err, TurnstileError::Config(_)));
    }

    #[test]
    fn test_negative_values_fall_back() {
        let config = Configuration::load(
            None,
            vec![(LOCK_TIMEOUT_SECS.to_string(), "-5".to_string())],
        )
        .unwrap();

        assert_eq!(config.lock_timeout(), DEFAULT_LOCK_TIMEOUT);
    }
}
