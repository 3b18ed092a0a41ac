use crate::ports::outbound::{Clock, Lease, LeaseAcquisition, LeaseStore};
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// In-process LeaseStore
///
/// Acquisition is atomic per key through the map's entry lock, so workers
/// sharing one store (e.g. tasks in one process) exclude each other.
pub struct InMemoryLeaseStore {
    leases: DashMap<String, Lease>,
    clock: Arc<dyn Clock>,
}

impl InMemoryLeaseStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            leases: DashMap::new(),
            clock,
        }
    }

    /// The lease currently recorded for `key`, expired or not
    pub fn holder(&self, key: &str) -> Option<Lease> {
        self.leases.get(key).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl LeaseStore for InMemoryLeaseStore {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<LeaseAcquisition> {
        let now = self.clock.now();
        match self.leases.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().is_expired(now) {
                    return Ok(LeaseAcquisition::Busy);
                }
                let lease = Lease::issue(key, now, ttl)?;
                occupied.insert(lease.clone());
                Ok(LeaseAcquisition::Acquired(lease))
            }
            Entry::Vacant(vacant) => {
                let lease = Lease::issue(key, now, ttl)?;
                vacant.insert(lease.clone());
                Ok(LeaseAcquisition::Acquired(lease))
            }
        }
    }

    async fn release(&self, lease: &Lease) -> Result<()> {
        self.leases
            .remove_if(lease.key(), |_, held| held.token() == lease.token());
        Ok(())
    }
}
