use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::{
    default_connection_retries, default_connection_timeout_ms, default_max_in_flight,
    default_retry_backoff_base_ms, default_retry_backoff_max_ms, Config, Endpoint,
};

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Failed to parse config file '{path}': {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Primary and backup server addresses and ports cannot be identical")]
    IdenticalEndpoints,
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "file_open_failed",
            ConfigError::Parse { .. } => "parse_error",
            ConfigError::Toml { .. } => "parse_error",
            ConfigError::Validation { .. } => "validation_error",
            ConfigError::IdenticalEndpoints => "identical_endpoints",
        }
    }

    fn validation(message: impl Into<String>) -> Self {
        ConfigError::Validation {
            message: message.into(),
        }
    }
}

const RETRIES_RANGE: (i64, i64) = (0, 100);
const TIMEOUT_RANGE: (i64, i64) = (100, 60_000);
const PORT_RANGE: (i64, i64) = (1, 65_535);

impl Config {
    /// Returns the default configuration file path.
    ///
    /// Uses `~/.config/kvlink/config.toml` on Unix/macOS, or the equivalent
    /// on other platforms via `dirs::config_dir()`. Falls back to the current
    /// directory if config_dir is unavailable.
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("kvlink").join("config.toml")
    }

    /// Loads and validates configuration from `path`.
    ///
    /// Files ending in `.toml` are parsed as TOML; anything else is read as
    /// flat `key = value` lines.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let config = if is_toml {
            toml::from_str::<Config>(&content).map_err(|e| ConfigError::Toml {
                path: path.to_path_buf(),
                source: e,
            })?
        } else {
            Self::from_flat_str(&content)?
        };

        config.validate()?;
        tracing::debug!(
            path = %path.display(),
            primary = %config.primary,
            backup = %config.backup,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parses flat `key = value` text into a config.
    ///
    /// Blank lines and `#` comments are ignored. A line without `=` or with
    /// an empty key is rejected with its 1-based line number.
    pub fn from_flat_str(content: &str) -> Result<Self, ConfigError> {
        let mut raw = HashMap::new();

        for (index, line) in content.lines().enumerate() {
            let line_number = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Parse {
                    line: line_number,
                    message: format!("Missing '=' delimiter. Line: '{}'", line),
                });
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::Parse {
                    line: line_number,
                    message: format!("Key is empty. Line: '{}'", line),
                });
            }

            raw.insert(key.to_string(), value.trim().to_string());
        }

        let config = Config {
            primary: Endpoint {
                address: required(&raw, "primary_server_address")?.to_string(),
                port: int_in_range(&raw, "primary_server_port", PORT_RANGE)? as u16,
            },
            backup: Endpoint {
                address: required(&raw, "backup_server_address")?.to_string(),
                port: int_in_range(&raw, "backup_server_port", PORT_RANGE)? as u16,
            },
            connection_retries: optional_int(&raw, "connection_retries", RETRIES_RANGE)?
                .map(|v| v as u32)
                .unwrap_or_else(default_connection_retries),
            connection_timeout_ms: optional_int(&raw, "connection_timeout_ms", TIMEOUT_RANGE)?
                .map(|v| v as u64)
                .unwrap_or_else(default_connection_timeout_ms),
            retry_backoff_base_ms: optional_int(&raw, "retry_backoff_base_ms", (1, 10_000))?
                .map(|v| v as u64)
                .unwrap_or_else(default_retry_backoff_base_ms),
            retry_backoff_max_ms: optional_int(&raw, "retry_backoff_max_ms", (1, 60_000))?
                .map(|v| v as u64)
                .unwrap_or_else(default_retry_backoff_max_ms),
            max_in_flight: optional_int(&raw, "max_in_flight", (1, 10_000))?
                .map(|v| v as usize)
                .unwrap_or_else(default_max_in_flight),
        };

        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - Both addresses are non-empty and both ports are non-zero
    /// - Retry count and timeout are within their allowed ranges
    /// - Backoff base does not exceed the backoff ceiling
    /// - Primary and backup are different endpoints
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, endpoint) in [("primary", &self.primary), ("backup", &self.backup)] {
            if endpoint.address.trim().is_empty() {
                return Err(ConfigError::validation(format!(
                    "Missing or empty required parameter: {}_server_address",
                    name
                )));
            }
            if endpoint.port == 0 {
                return Err(ConfigError::validation(format!(
                    "Parameter '{}_server_port' value 0 is less than minimum allowed 1",
                    name
                )));
            }
        }

        check_range(
            "connection_retries",
            i64::from(self.connection_retries),
            RETRIES_RANGE,
        )?;
        check_range(
            "connection_timeout_ms",
            i64::try_from(self.connection_timeout_ms).unwrap_or(i64::MAX),
            TIMEOUT_RANGE,
        )?;

        if self.retry_backoff_base_ms == 0 {
            return Err(ConfigError::validation(
                "Parameter 'retry_backoff_base_ms' must be greater than 0",
            ));
        }
        if self.retry_backoff_base_ms > self.retry_backoff_max_ms {
            return Err(ConfigError::validation(format!(
                "Parameter 'retry_backoff_base_ms' ({}) exceeds 'retry_backoff_max_ms' ({})",
                self.retry_backoff_base_ms, self.retry_backoff_max_ms
            )));
        }
        if self.max_in_flight == 0 {
            return Err(ConfigError::validation(
                "Parameter 'max_in_flight' must be at least 1",
            ));
        }

        if self.primary == self.backup {
            return Err(ConfigError::IdenticalEndpoints);
        }

        Ok(())
    }
}

fn required<'a>(raw: &'a HashMap<String, String>, key: &str) -> Result<&'a str, ConfigError> {
    match raw.get(key) {
        Some(value) if !value.is_empty() => Ok(value.as_str()),
        _ => Err(ConfigError::validation(format!(
            "Missing or empty required parameter: {}",
            key
        ))),
    }
}

fn int_in_range(
    raw: &HashMap<String, String>,
    key: &str,
    range: (i64, i64),
) -> Result<i64, ConfigError> {
    let text = required(raw, key)?;
    let value = text.parse::<i64>().map_err(|e| {
        ConfigError::validation(format!(
            "Invalid integer value for parameter '{}': {}. {}",
            key, text, e
        ))
    })?;
    check_range(key, value, range)?;
    Ok(value)
}

fn optional_int(
    raw: &HashMap<String, String>,
    key: &str,
    range: (i64, i64),
) -> Result<Option<i64>, ConfigError> {
    if !raw.contains_key(key) {
        return Ok(None);
    }
    int_in_range(raw, key, range).map(Some)
}

fn check_range(key: &str, value: i64, (min, max): (i64, i64)) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::validation(format!(
            "Parameter '{}' value {} is less than minimum allowed {}",
            key, value, min
        )));
    }
    if value > max {
        return Err(ConfigError::validation(format!(
            "Parameter '{}' value {} is greater than maximum allowed {}",
            key, value, max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = "\
# servers
primary_server_address = 127.0.0.1
primary_server_port = 8080
backup_server_address = 127.0.0.2
backup_server_port = 8081
";

    #[test]
    fn flat_config_uses_defaults_for_optional_keys() {
        let config = Config::from_flat_str(BASIC).unwrap();
        assert_eq!(config.primary, Endpoint::new("127.0.0.1", 8080));
        assert_eq!(config.backup, Endpoint::new("127.0.0.2", 8081));
        assert_eq!(config.connection_retries, 3);
        assert_eq!(config.connection_timeout_ms, 5000);
        config.validate().unwrap();
    }

    #[test]
    fn missing_delimiter_reports_line_number() {
        let text = format!("{}\nthis line is broken\n", BASIC);
        let err = Config::from_flat_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 7, .. }), "{err:?}");
        assert_eq!(err.code(), "parse_error");
    }

    #[test]
    fn empty_key_is_parse_error() {
        let err = Config::from_flat_str(" = value\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 1, .. }));
    }

    #[test]
    fn port_out_of_range_is_validation_error() {
        let text = BASIC.replace("8081", "70000");
        let err = Config::from_flat_str(&text).unwrap_err();
        assert!(err.to_string().contains("greater than maximum allowed 65535"));
    }

    #[test]
    fn non_integer_retries_is_validation_error() {
        let text = format!("{}connection_retries = lots\n", BASIC);
        let err = Config::from_flat_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn identical_endpoints_rejected() {
        let mut config = Config::from_flat_str(BASIC).unwrap();
        config.backup = config.primary.clone();
        assert!(matches!(config.validate(), Err(ConfigError::IdenticalEndpoints)));
    }

    #[test]
    fn same_address_different_port_is_fine() {
        let text = BASIC.replace("127.0.0.2", "127.0.0.1");
        let config = Config::from_flat_str(&text).unwrap();
        config.validate().unwrap();
    }
}
