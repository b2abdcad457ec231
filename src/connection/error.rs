use std::fmt;

use thiserror::Error;

use crate::config::Endpoint;

/// Which of the two configured servers an attempt targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerRole {
    Primary,
    Backup,
}

impl fmt::Display for ServerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerRole::Primary => f.write_str("primary"),
            ServerRole::Backup => f.write_str("backup"),
        }
    }
}

/// Errors raised while establishing a connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// Retryable failure (refused, reset, unreachable)
    #[error("Transient connection failure to {role} server {endpoint}")]
    Transient { role: ServerRole, endpoint: Endpoint },

    /// Non-retryable failure (rejected, misconfigured)
    #[error("Permanent connection failure to {role} server {endpoint}")]
    Permanent { role: ServerRole, endpoint: Endpoint },

    /// The attempt did not finish within the configured timeout
    #[error("Connection attempt to {role} server {endpoint} timed out after {after_ms} ms")]
    TimedOut {
        role: ServerRole,
        endpoint: Endpoint,
        after_ms: u64,
    },

    /// The server answered but no local handle could be allocated
    #[error("Failed to acquire network resource for {endpoint}: {reason}")]
    ResourceAcquisition { endpoint: Endpoint, reason: String },

    /// Both servers failed; the supervisor is offline
    #[error(
        "All primary and backup server connection attempts failed. Offline mode. Last error: {last}"
    )]
    Offline { last: Box<ConnectError> },
}

impl ConnectError {
    /// Whether another attempt against the same server may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ConnectError::Transient { .. } | ConnectError::TimedOut { .. }
        )
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, ConnectError::Offline { .. })
    }

    /// Stable error code for logs and reports
    pub fn code(&self) -> &'static str {
        match self {
            ConnectError::Transient { .. } => "transient_connection_failure",
            ConnectError::Permanent { .. } => "permanent_connection_failure",
            ConnectError::TimedOut { .. } => "connection_timeout",
            ConnectError::ResourceAcquisition { .. } => "resource_acquisition_failed",
            ConnectError::Offline { .. } => "offline",
        }
    }
}
