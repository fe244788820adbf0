//! Configuration Module
//!
//! Handles loading and managing cache proxy configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Cache proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Maximum number of entries the in-memory store can hold
    pub max_entries: usize,
    /// TTL in seconds for routes without an explicit policy
    pub default_ttl: u64,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Hit ratio (percent) at or above which the cache reports healthy
    pub health_threshold: f64,
    /// Connected clients above which health reports a warning
    pub connection_limit: usize,
    /// Base URL of the upstream CRUD service
    pub upstream_url: String,
    /// Upstream request timeout in seconds
    pub upstream_timeout: u64,
    /// Run the warmup protocol once at startup
    pub warmup_on_start: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `MAX_ENTRIES` - In-memory store capacity (default: 10000)
    /// - `DEFAULT_TTL` - Fallback TTL in seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 5)
    /// - `CACHE_HEALTH_THRESHOLD` - Healthy hit ratio percent (default: 50.0)
    /// - `CACHE_CONNECTION_LIMIT` - Client count that triggers a health warning (default: 100)
    /// - `UPSTREAM_URL` - Upstream service (default: http://127.0.0.1:8080)
    /// - `UPSTREAM_TIMEOUT` - Upstream timeout in seconds (default: 10)
    /// - `WARMUP_ON_START` - Warm the cache at startup (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            health_threshold: env_or("CACHE_HEALTH_THRESHOLD", defaults.health_threshold),
            connection_limit: env_or("CACHE_CONNECTION_LIMIT", defaults.connection_limit),
            upstream_url: env::var("UPSTREAM_URL")
                .ok()
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.upstream_url),
            upstream_timeout: env_or("UPSTREAM_TIMEOUT", defaults.upstream_timeout),
            warmup_on_start: env_or("WARMUP_ON_START", defaults.warmup_on_start),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            max_entries: 10_000,
            default_ttl: 300,
            cleanup_interval: 5,
            health_threshold: 50.0,
            connection_limit: 100,
            upstream_url: "http://127.0.0.1:8080".to_string(),
            upstream_timeout: 10,
            warmup_on_start: false,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.max_entries, 10_000);
        assert_eq!(config.default_ttl, 300);
        assert_eq!(config.cleanup_interval, 5);
        assert_eq!(config.health_threshold, 50.0);
        assert_eq!(config.connection_limit, 100);
        assert_eq!(config.upstream_url, "http://127.0.0.1:8080");
        assert!(!config.warmup_on_start);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        env::set_var("METER_CACHE_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("METER_CACHE_TEST_GARBAGE", 42u64), 42);
        env::remove_var("METER_CACHE_TEST_GARBAGE");
    }

    #[test]
    fn test_env_or_parses_value() {
        env::set_var("METER_CACHE_TEST_THRESHOLD", "75.5");
        assert_eq!(env_or("METER_CACHE_TEST_THRESHOLD", 50.0f64), 75.5);
        env::remove_var("METER_CACHE_TEST_THRESHOLD");
    }
}
