//! Fault injection and latency simulation for the simulated transport.
//!
//! A [`FaultPlan`] is owned by one connector instance; nothing here is
//! process-wide.

use std::time::Duration;

use rand::Rng;

use crate::connection::error::ServerRole;

/// How an injected connect failure is classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailureKind {
    #[default]
    Transient,
    Permanent,
}

/// Failures to inject for one server.
///
/// The first `failures` connect attempts against the server fail with
/// `kind`; every later attempt succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerFaults {
    pub failures: u32,
    pub kind: FailureKind,
}

impl ServerFaults {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn transient(failures: u32) -> Self {
        Self {
            failures,
            kind: FailureKind::Transient,
        }
    }

    /// Reject the first attempt permanently.
    pub fn permanent() -> Self {
        Self {
            failures: 1,
            kind: FailureKind::Permanent,
        }
    }

    /// Fail every attempt.
    pub fn unreachable(kind: FailureKind) -> Self {
        Self {
            failures: u32::MAX,
            kind,
        }
    }
}

/// Per-server failure schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultPlan {
    pub primary: ServerFaults,
    pub backup: ServerFaults,
}

impl FaultPlan {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_primary(mut self, faults: ServerFaults) -> Self {
        self.primary = faults;
        self
    }

    pub fn with_backup(mut self, faults: ServerFaults) -> Self {
        self.backup = faults;
        self
    }

    pub fn for_role(&self, role: ServerRole) -> ServerFaults {
        match role {
            ServerRole::Primary => self.primary,
            ServerRole::Backup => self.backup,
        }
    }
}

/// Uniformly distributed artificial delay standing in for network I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyModel {
    min: Duration,
    max: Duration,
}

impl LatencyModel {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn zero() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn fixed(delay: Duration) -> Self {
        Self::new(delay, delay)
    }

    pub fn sample(&self) -> Duration {
        if self.max == self.min {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }

    /// Sleep for one sampled delay. Returns immediately for a zero sample.
    pub async fn wait(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for LatencyModel {
    /// 5 to 15 ms, roughly a local network round trip.
    fn default() -> Self {
        Self::new(Duration::from_millis(5), Duration::from_millis(15))
    }
}
