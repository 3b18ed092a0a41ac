use crate::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// A time-bounded exclusive claim on a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    key: String,
    token: Uuid,
    expires_at: DateTime<Utc>,
}

impl Lease {
    pub fn new(key: String, token: Uuid, expires_at: DateTime<Utc>) -> Self {
        Self {
            key,
            token,
            expires_at,
        }
    }

    /// Creates a lease with a fresh random token
    pub fn issue(key: &str, now: DateTime<Utc>, ttl: Duration) -> Result<Self> {
        let ttl = TimeDelta::from_std(ttl)?;
        Ok(Self::new(key.to_string(), Uuid::new_v4(), now + ttl))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Time left before the lease may be taken over; negative once expired
    pub fn remaining(&self, now: DateTime<Utc>) -> TimeDelta {
        self.expires_at - now
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Outcome of a single non-blocking acquisition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseAcquisition {
    Acquired(Lease),
    /// Another holder owns an unexpired lease on the key
    Busy,
}

/// LeaseStore port for distributed mutual exclusion
///
/// `try_acquire` never waits and never retries; retrying is the
/// scheduler's business.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<LeaseAcquisition>;

    /// Releases `lease` if it is still the current holder; otherwise a no-op
    async fn release(&self, lease: &Lease) -> Result<()>;
}

#[async_trait]
impl<T: LeaseStore + ?Sized> LeaseStore for Arc<T> {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<LeaseAcquisition> {
        (**self).try_acquire(key, ttl).await
    }

    async fn release(&self, lease: &Lease) -> Result<()> {
        (**self).release(lease).await
    }
}
