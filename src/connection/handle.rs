use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::Endpoint;
use crate::connection::error::ConnectError;

/// Sentinel id carried by a released handle.
const RELEASED: u64 = 0;

/// Opaque token for one live simulated connection.
///
/// Not `Clone`: the supervisor is the only owner.
#[derive(Debug, PartialEq, Eq)]
pub struct NetworkHandle {
    id: u64,
    endpoint: Endpoint,
}

impl NetworkHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_valid(&self) -> bool {
        self.id != RELEASED
    }

    /// Invalidate the handle. Idempotent.
    pub fn release(&mut self) {
        self.id = RELEASED;
    }
}

/// Mints handles with ids unique for the allocator's lifetime.
#[derive(Debug)]
pub struct HandleAllocator {
    next: AtomicU64,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(RELEASED + 1),
        }
    }

    pub fn allocate(&self, endpoint: &Endpoint) -> Result<NetworkHandle, ConnectError> {
        let id = self
            .next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| id.checked_add(1))
            .map_err(|_| ConnectError::ResourceAcquisition {
                endpoint: endpoint.clone(),
                reason: "handle space exhausted".to_string(),
            })?;

        Ok(NetworkHandle {
            id,
            endpoint: endpoint.clone(),
        })
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}
