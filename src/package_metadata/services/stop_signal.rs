use crate::ports::outbound::{Clock, Lease};
use crate::shared::error::SyncError;
use crate::shared::Result;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// StopSignal - cooperative, time-boxed cancellation check
///
/// Fires when the run has lasted `max_run_duration`, or when the lease has
/// less than `lease_ttl - max_run_duration` left. Once it has fired it
/// keeps returning `true`. Performs no I/O.
pub struct StopSignal {
    clock: Arc<dyn Clock>,
    started_at: DateTime<Utc>,
    lease_expires_at: DateTime<Utc>,
    max_run_duration: TimeDelta,
    safety_margin: TimeDelta,
    fired: AtomicBool,
}

impl StopSignal {
    /// Starts the run clock for `lease`
    ///
    /// # Errors
    /// Returns a configuration error unless `max_run_duration < lease_ttl`.
    pub fn new(
        lease: &Lease,
        lease_ttl: Duration,
        max_run_duration: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if max_run_duration >= lease_ttl {
            return Err(SyncError::configuration(
                format!(
                    "max run duration ({}s) must be shorter than the lease TTL ({}s)",
                    max_run_duration.as_secs(),
                    lease_ttl.as_secs()
                ),
                "Lower max_run_duration_secs or raise lease_ttl_secs",
            )
            .into());
        }

        let max_run_duration = TimeDelta::from_std(max_run_duration)?;
        let safety_margin = TimeDelta::from_std(lease_ttl)? - max_run_duration;

        Ok(Self {
            started_at: clock.now(),
            clock,
            lease_expires_at: lease.expires_at(),
            max_run_duration,
            safety_margin,
            fired: AtomicBool::new(false),
        })
    }

    pub fn should_stop(&self) -> bool {
        if self.fired.load(Ordering::Relaxed) {
            return true;
        }

        let now = self.clock.now();
        let elapsed = now - self.started_at;
        let lease_remaining = self.lease_expires_at - now;

        if elapsed >= self.max_run_duration || lease_remaining < self.safety_margin {
            self.fired.store(true, Ordering::Relaxed);
            return true;
        }
        false
    }

    pub fn safety_margin(&self) -> TimeDelta {
        self.safety_margin
    }
}
