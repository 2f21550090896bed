//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::fetch::DEFAULT_FETCH_TTL;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL; the in-memory store is used when unset
    pub redis_url: Option<String>,
    /// Lifetime of cached fetch results in seconds
    pub fetch_ttl: u64,
    /// Timeout of a single HTTP fetch in seconds
    pub fetch_timeout: u64,
    /// Whether concurrent misses for one resource share a single fetch
    pub fetch_dedup: bool,
    /// HTTP server port
    pub server_port: u16,
    /// Memory store cleanup interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Redis URL (default: unset, in-memory store)
    /// - `FETCH_TTL` - Fetch cache TTL in seconds (default: 10)
    /// - `FETCH_TIMEOUT` - HTTP fetch timeout in seconds (default: 30)
    /// - `FETCH_DEDUP` - De-duplicate concurrent misses (default: true)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
            fetch_ttl: parse_var("FETCH_TTL").unwrap_or(defaults.fetch_ttl),
            fetch_timeout: parse_var("FETCH_TIMEOUT").unwrap_or(defaults.fetch_timeout),
            fetch_dedup: parse_var("FETCH_DEDUP").unwrap_or(defaults.fetch_dedup),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            fetch_ttl: DEFAULT_FETCH_TTL,
            fetch_timeout: 30,
            fetch_dedup: true,
            server_port: 3000,
            cleanup_interval: 1,
        }
    }
}
