//! Client-side connection management with retry, backoff and failover.
//!
//! The [`ConnectionSupervisor`] owns the link state machine
//! (`Disconnected` → `ConnectedPrimary` | `ConnectedBackup`). Transport is
//! abstracted behind [`Connector`]; the shipped implementation is the
//! [`SimulatedConnector`], whose failures come from a per-instance
//! [`FaultPlan`].

mod backoff;
mod connector;
mod error;
mod fault;
mod handle;
mod supervisor;

pub use backoff::BackoffPolicy;
pub use connector::{Connector, SimulatedConnector};
pub use error::{ConnectError, ServerRole};
pub use fault::{FailureKind, FaultPlan, LatencyModel, ServerFaults};
pub use handle::{HandleAllocator, NetworkHandle};
pub use supervisor::{ConnectionState, ConnectionStatus, ConnectionSupervisor, ModeChange};
