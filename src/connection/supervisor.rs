//! Connection lifecycle: primary with retries, single backup attempt, then
//! offline.
//!
//! State (mode + handle) lives behind one lock. Establishment is serialized by
//! a separate async gate so the lock is never held across an await point.

use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::config::{Config, Endpoint};
use crate::connection::backoff::BackoffPolicy;
use crate::connection::connector::{Connector, SimulatedConnector};
use crate::connection::error::{ConnectError, ServerRole};
use crate::connection::fault::{FaultPlan, LatencyModel};
use crate::connection::handle::NetworkHandle;
use crate::query::{Query, QueryError, QueryResult, RemoteExecutor};
use crate::store::CommandProcessor;

/// Current connection target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    ConnectedPrimary,
    ConnectedBackup,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        !matches!(self, ConnectionState::Disconnected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::ConnectedPrimary => "primary",
            ConnectionState::ConnectedBackup => "backup",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log entry for a mode change.
#[derive(Debug, Clone)]
pub struct ModeChange {
    /// When the change occurred.
    pub timestamp: SystemTime,
    pub from: ConnectionState,
    pub to: ConnectionState,
}

/// Point-in-time view of the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// `"host:port"` of the live server, or `"Disconnected"`.
    pub address: String,
    pub handle_id: Option<u64>,
}

struct Link {
    state: ConnectionState,
    handle: Option<NetworkHandle>,
    transitions: Vec<ModeChange>,
}

impl Link {
    fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }
        self.transitions.push(ModeChange {
            timestamp: SystemTime::now(),
            from: self.state,
            to: state,
        });
        self.state = state;
    }

    fn release_handle(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            tracing::debug!(
                handle_id = handle.id(),
                endpoint = %handle.endpoint(),
                "Releasing network handle"
            );
            handle.release();
        }
    }

    fn has_live_handle(&self) -> bool {
        self.handle.as_ref().is_some_and(NetworkHandle::is_valid)
    }
}

/// Owns the client side of the link and forwards queries to the server.
pub struct ConnectionSupervisor {
    config: Config,
    connector: Arc<dyn Connector>,
    processor: CommandProcessor,
    backoff: BackoffPolicy,
    query_latency: LatencyModel,
    link: RwLock<Link>,
    establishing: tokio::sync::Mutex<()>,
}

impl ConnectionSupervisor {
    pub fn new(config: Config, processor: CommandProcessor, connector: Arc<dyn Connector>) -> Self {
        let backoff = BackoffPolicy::from_config(&config);
        Self {
            config,
            connector,
            processor,
            backoff,
            query_latency: LatencyModel::default(),
            link: RwLock::new(Link {
                state: ConnectionState::Disconnected,
                handle: None,
                transitions: Vec::new(),
            }),
            establishing: tokio::sync::Mutex::new(()),
        }
    }

    /// Supervisor over a [`SimulatedConnector`] running `plan`.
    pub fn simulated(config: Config, processor: CommandProcessor, plan: FaultPlan) -> Self {
        Self::new(config, processor, Arc::new(SimulatedConnector::new(plan)))
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Artificial per-query network delay applied while connected.
    pub fn with_query_latency(mut self, latency: LatencyModel) -> Self {
        self.query_latency = latency;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn processor(&self) -> &CommandProcessor {
        &self.processor
    }

    /// Connect to the primary, falling back to the backup, then offline.
    ///
    /// A no-op while already connected. On total failure the supervisor is
    /// left `Disconnected` with no handle and the error is
    /// [`ConnectError::Offline`] wrapping the backup's failure.
    pub async fn establish(&self) -> Result<(), ConnectError> {
        let _gate = self.establishing.lock().await;

        let already_connected = self.link.read().state.is_connected();
        if already_connected {
            tracing::debug!("Already connected, establish is a no-op");
            return Ok(());
        }

        self.reset();

        let primary_error = match self.connect_primary().await {
            Ok(handle) => {
                self.commit(ConnectionState::ConnectedPrimary, handle);
                return Ok(());
            }
            Err(err) => err,
        };

        tracing::warn!(
            error = %primary_error,
            backup = %self.config.backup,
            "Primary server unavailable, failing over to backup"
        );

        match self.attempt(ServerRole::Backup, &self.config.backup).await {
            Ok(handle) => {
                self.commit(ConnectionState::ConnectedBackup, handle);
                Ok(())
            }
            Err(backup_error) => {
                self.reset();
                tracing::error!(
                    error = %backup_error,
                    "Backup server unavailable, going offline"
                );
                Err(ConnectError::Offline {
                    last: Box::new(backup_error),
                })
            }
        }
    }

    /// Up to `connection_retries + 1` attempts. Transient failures back off
    /// and retry; a permanent failure ends the phase immediately.
    async fn connect_primary(&self) -> Result<NetworkHandle, ConnectError> {
        let retries = self.config.connection_retries;
        let mut attempt = 0u32;

        loop {
            let err = match self.attempt(ServerRole::Primary, &self.config.primary).await {
                Ok(handle) => return Ok(handle),
                Err(err) => err,
            };

            if !err.is_transient() {
                tracing::warn!(
                    attempt = attempt + 1,
                    error = %err,
                    "Permanent primary failure, not retrying"
                );
                return Err(err);
            }
            if attempt >= retries {
                tracing::warn!(
                    attempts = attempt + 1,
                    error = %err,
                    "Primary retry budget exhausted"
                );
                return Err(err);
            }

            let delay = self.backoff.delay(attempt);
            tracing::warn!(
                attempt = attempt + 1,
                max_attempts = retries + 1,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Transient primary failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// One connect attempt, bounded by the configured timeout.
    async fn attempt(
        &self,
        role: ServerRole,
        endpoint: &Endpoint,
    ) -> Result<NetworkHandle, ConnectError> {
        let timeout = self.config.connection_timeout();
        tracing::debug!(%role, %endpoint, "Connecting");

        match tokio::time::timeout(timeout, self.connector.connect(role, endpoint)).await {
            Ok(result) => result,
            Err(_) => Err(ConnectError::TimedOut {
                role,
                endpoint: endpoint.clone(),
                after_ms: timeout.as_millis() as u64,
            }),
        }
    }

    fn commit(&self, state: ConnectionState, handle: NetworkHandle) {
        let mut link = self.link.write();
        link.release_handle();

        tracing::info!(
            mode = %state,
            endpoint = %handle.endpoint(),
            handle_id = handle.id(),
            "Connection established"
        );

        link.handle = Some(handle);
        link.set_state(state);
    }

    /// Release any held handle and return to `Disconnected`.
    pub fn reset(&self) {
        let mut link = self.link.write();
        link.release_handle();
        link.set_state(ConnectionState::Disconnected);
    }

    pub fn is_connected(&self) -> bool {
        let link = self.link.read();
        link.state.is_connected() && link.has_live_handle()
    }

    pub fn state(&self) -> ConnectionState {
        self.link.read().state
    }

    /// `"host:port"` of the current server, or `"Disconnected"`.
    pub fn current_server_address(&self) -> String {
        let link = self.link.read();
        self.address_for(&link)
    }

    fn address_for(&self, link: &Link) -> String {
        if let Some(handle) = link.handle.as_ref().filter(|h| h.is_valid()) {
            return handle.endpoint().to_string();
        }
        match link.state {
            ConnectionState::ConnectedPrimary => self.config.primary.to_string(),
            ConnectionState::ConnectedBackup => self.config.backup.to_string(),
            ConnectionState::Disconnected => "Disconnected".to_string(),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        let link = self.link.read();
        ConnectionStatus {
            state: link.state,
            address: self.address_for(&link),
            handle_id: link
                .handle
                .as_ref()
                .filter(|h| h.is_valid())
                .map(NetworkHandle::id),
        }
    }

    /// Mode changes since construction, oldest first.
    pub fn transitions(&self) -> Vec<ModeChange> {
        self.link.read().transitions.clone()
    }

    /// Forward `query` to the server if a link is live.
    ///
    /// Without a link this returns a `NoActiveConnection` failure with zero
    /// elapsed time and never touches the store. Store outcomes are passed
    /// through unchanged.
    pub async fn execute_remote_query(&self, query: &Query, depth: u32) -> QueryResult {
        if !self.is_connected() {
            return QueryResult::failure(
                query.id,
                QueryError::NoActiveConnection { query_id: query.id },
            );
        }

        self.query_latency.wait().await;
        self.processor.process(query, depth)
    }
}

#[async_trait]
impl RemoteExecutor for ConnectionSupervisor {
    async fn execute(&self, query: &Query, depth: u32) -> QueryResult {
        self.execute_remote_query(query, depth).await
    }
}
