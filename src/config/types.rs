use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration container.
///
/// Immutable once loaded; the connection supervisor borrows a clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Server tried first, with retries.
    pub primary: Endpoint,
    /// Server tried once after the primary is given up on.
    pub backup: Endpoint,
    /// Extra primary attempts after the first (default: 3).
    #[serde(default = "default_connection_retries")]
    pub connection_retries: u32,
    /// Per-attempt connect timeout in milliseconds (default: 5000).
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    /// Base backoff in milliseconds between primary retries (default: 50).
    #[serde(default = "default_retry_backoff_base_ms")]
    pub retry_backoff_base_ms: u64,
    /// Ceiling for the backoff delay in milliseconds (default: 1000).
    #[serde(default = "default_retry_backoff_max_ms")]
    pub retry_backoff_max_ms: u64,
    /// Max queries executing at once within a batch (default: 64).
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

/// A server address and port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

pub(crate) fn default_connection_retries() -> u32 {
    3
}

pub(crate) fn default_connection_timeout_ms() -> u64 {
    5000
}

pub(crate) fn default_retry_backoff_base_ms() -> u64 {
    50
}

pub(crate) fn default_retry_backoff_max_ms() -> u64 {
    1000
}

pub(crate) fn default_max_in_flight() -> usize {
    64
}

impl Config {
    /// Build a config with default tuning for the two endpoints.
    pub fn new(primary: Endpoint, backup: Endpoint) -> Self {
        Self {
            primary,
            backup,
            connection_retries: default_connection_retries(),
            connection_timeout_ms: default_connection_timeout_ms(),
            retry_backoff_base_ms: default_retry_backoff_base_ms(),
            retry_backoff_max_ms: default_retry_backoff_max_ms(),
            max_in_flight: default_max_in_flight(),
        }
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_display_is_host_colon_port() {
        assert_eq!(Endpoint::new("10.0.0.1", 9000).to_string(), "10.0.0.1:9000");
    }

    #[test]
    fn new_uses_defaults() {
        let config = Config::new(Endpoint::new("a", 1), Endpoint::new("b", 2));
        assert_eq!(config.connection_retries, 3);
        assert_eq!(config.connection_timeout(), Duration::from_millis(5000));
        assert_eq!(config.retry_backoff_base_ms, 50);
        assert_eq!(config.retry_backoff_max_ms, 1000);
        assert_eq!(config.max_in_flight, 64);
    }
}
