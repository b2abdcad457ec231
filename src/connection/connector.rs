use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::config::Endpoint;
use crate::connection::error::{ConnectError, ServerRole};
use crate::connection::fault::{FailureKind, FaultPlan, LatencyModel};
use crate::connection::handle::{HandleAllocator, NetworkHandle};

/// Opens links to a server.
///
/// Implementations classify every failure through [`ConnectError`]; the
/// supervisor decides on retries from that classification alone.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        role: ServerRole,
        endpoint: &Endpoint,
    ) -> Result<NetworkHandle, ConnectError>;
}

/// In-process transport driven by a [`FaultPlan`].
///
/// Each attempt sleeps for one latency sample, then either fails according
/// to the plan or hands out a fresh handle.
#[derive(Debug)]
pub struct SimulatedConnector {
    plan: FaultPlan,
    latency: LatencyModel,
    handles: HandleAllocator,
    primary_attempts: AtomicU32,
    backup_attempts: AtomicU32,
}

impl SimulatedConnector {
    pub fn new(plan: FaultPlan) -> Self {
        Self {
            plan,
            latency: LatencyModel::default(),
            handles: HandleAllocator::new(),
            primary_attempts: AtomicU32::new(0),
            backup_attempts: AtomicU32::new(0),
        }
    }

    pub fn with_latency(mut self, latency: LatencyModel) -> Self {
        self.latency = latency;
        self
    }

    pub fn plan(&self) -> &FaultPlan {
        &self.plan
    }

    /// Connect attempts made against `role` so far, failed or not.
    pub fn attempts(&self, role: ServerRole) -> u32 {
        self.counter(role).load(Ordering::SeqCst)
    }

    fn counter(&self, role: ServerRole) -> &AtomicU32 {
        match role {
            ServerRole::Primary => &self.primary_attempts,
            ServerRole::Backup => &self.backup_attempts,
        }
    }
}

#[async_trait]
impl Connector for SimulatedConnector {
    async fn connect(
        &self,
        role: ServerRole,
        endpoint: &Endpoint,
    ) -> Result<NetworkHandle, ConnectError> {
        let attempt = self.counter(role).fetch_add(1, Ordering::SeqCst);
        self.latency.wait().await;

        let faults = self.plan.for_role(role);
        if attempt < faults.failures {
            tracing::debug!(
                %role,
                %endpoint,
                attempt = attempt + 1,
                kind = ?faults.kind,
                "Injected connect failure"
            );
            return Err(match faults.kind {
                FailureKind::Transient => ConnectError::Transient {
                    role,
                    endpoint: endpoint.clone(),
                },
                FailureKind::Permanent => ConnectError::Permanent {
                    role,
                    endpoint: endpoint.clone(),
                },
            });
        }

        self.handles.allocate(endpoint)
    }
}
