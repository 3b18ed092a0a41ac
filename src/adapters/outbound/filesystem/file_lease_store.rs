use super::json_document::read_document;
use crate::ports::outbound::{Clock, Lease, LeaseAcquisition, LeaseStore};
use crate::shared::error::SyncError;
use crate::shared::security::MAX_STATE_FILE_SIZE;
use crate::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// How long retire markers are kept before they are pruned
const RETIRED_MARKER_RETENTION: Duration = Duration::from_secs(3600);

/// FileLeaseStore adapter for workers sharing a filesystem
///
/// A lease is a JSON file under `<state_dir>/leases/`, created with
/// `create_new` so that exactly one worker wins a free key.
///
/// A lease file is only ever removed by the worker that first creates its
/// retire marker `<key>.<id>.retired`, where `id` is the lease token (or the
/// modification time of a file that never became readable). Creating the
/// marker is exclusive, so an expired lease is taken over by one worker at
/// most, and a release that lost to a takeover leaves the new lease alone.
pub struct FileLeaseStore {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileLeaseStore {
    pub fn new(state_dir: &Path, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: state_dir.join("leases"),
            clock,
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }

    fn marker_prefix(key: &str) -> String {
        format!("{}.", urlencoding::encode(key))
    }

    fn marker_for(&self, key: &str, retire_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}.retired", Self::marker_prefix(key), retire_id))
    }

    fn lease_error(key: &str, error: impl std::fmt::Display) -> anyhow::Error {
        SyncError::Lease {
            key: key.to_string(),
            details: error.to_string(),
        }
        .into()
    }

    /// Current holder of `path`; a file that does not parse is reported with
    /// its modification time so that an abandoned one can be recognised.
    fn read_holder(&self, path: &Path) -> Result<Holder> {
        match read_document::<Lease>(path, MAX_STATE_FILE_SIZE) {
            Ok(Some(lease)) => Ok(Holder::Lease(lease)),
            Ok(None) => Ok(Holder::Free),
            Err(e) => match fs::metadata(path) {
                Ok(metadata) => {
                    tracing::debug!(path = %path.display(), error = %e, "unreadable lease file");
                    Ok(Holder::Unreadable {
                        modified: metadata.modified()?,
                    })
                }
                Err(missing) if missing.kind() == ErrorKind::NotFound => Ok(Holder::Free),
                Err(_) => Err(e),
            },
        }
    }

    /// Classifies the holder of `path` for a worker asking for `ttl`
    fn occupancy(&self, path: &Path, ttl: Duration) -> Result<Occupancy> {
        let now = self.clock.now();
        let occupancy = match self.read_holder(path)? {
            Holder::Free => Occupancy::Free,
            Holder::Lease(held) if !held.is_expired(now) => Occupancy::Held,
            Holder::Lease(held) => Occupancy::Stale {
                retire_id: held.token().to_string(),
                reason: format!("expired at {}", held.expires_at()),
            },
            Holder::Unreadable { modified } => {
                // A creator that has not written its lease within a full
                // TTL is gone
                let modified: DateTime<Utc> = modified.into();
                if now - modified < TimeDelta::from_std(ttl)? {
                    Occupancy::Held
                } else {
                    let nanos = modified.timestamp_nanos_opt().unwrap_or(i64::MAX);
                    Occupancy::Stale {
                        retire_id: format!("unreadable-{}", nanos),
                        reason: format!("unreadable since {}", modified),
                    }
                }
            }
        };
        Ok(occupancy)
    }

    /// Claims the exclusive right to remove the file named by `retire_id`
    fn try_retire(&self, key: &str, retire_id: &str) -> Result<bool> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.marker_for(key, retire_id))
        {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn try_create(&self, path: &Path, lease: &Lease) -> Result<bool> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        serde_json::to_writer(&mut file, lease)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        Ok(true)
    }

    /// Replaces the stale file named by `retire_id` with `lease`, unless
    /// another worker already claimed it.
    fn take_over(&self, path: &Path, retire_id: &str, lease: &Lease) -> Result<bool> {
        if !self.try_retire(lease.key(), retire_id)? {
            return Ok(false);
        }
        remove_if_present(path)?;
        self.prune_retired(lease.key());
        self.try_create(path, lease)
    }

    fn acquire(&self, key: &str, ttl: Duration) -> Result<LeaseAcquisition> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let lease = Lease::issue(key, self.clock.now(), ttl)?;

        if self.try_create(&path, &lease)? {
            return Ok(LeaseAcquisition::Acquired(lease));
        }

        let acquired = match self.occupancy(&path, ttl)? {
            Occupancy::Held => false,
            Occupancy::Free => self.try_create(&path, &lease)?,
            Occupancy::Stale { retire_id, reason } => {
                let taken = self.take_over(&path, &retire_id, &lease)?;
                if taken {
                    tracing::warn!(key, %reason, "took over stale lease");
                }
                taken
            }
        };

        if acquired {
            Ok(LeaseAcquisition::Acquired(lease))
        } else {
            Ok(LeaseAcquisition::Busy)
        }
    }

    fn release_sync(&self, lease: &Lease) -> Result<()> {
        let path = self.path_for(lease.key());
        match self.read_holder(&path)? {
            Holder::Lease(current) if current.token() == lease.token() => {
                if self.try_retire(lease.key(), &lease.token().to_string())? {
                    remove_if_present(&path)?;
                }
                self.prune_retired(lease.key());
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Removes retire markers of `key` older than the retention period
    fn prune_retired(&self, key: &str) {
        let prefix = Self::marker_prefix(key);
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(error = %e, "could not list lease directory");
                return;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(&prefix) || !name.ends_with(".retired") {
                continue;
            }
            let old_enough = entry
                .metadata()
                .and_then(|metadata| metadata.modified())
                .ok()
                .and_then(|modified| modified.elapsed().ok())
                .is_some_and(|age| age >= RETIRED_MARKER_RETENTION);
            if old_enough {
                if let Err(e) = fs::remove_file(entry.path()) {
                    tracing::debug!(path = %entry.path().display(), error = %e, "could not prune retire marker");
                }
            }
        }
    }
}

enum Holder {
    Free,
    Unreadable { modified: SystemTime },
    Lease(Lease),
}

enum Occupancy {
    Free,
    Held,
    Stale { retire_id: String, reason: String },
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl LeaseStore for FileLeaseStore {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<LeaseAcquisition> {
        self.acquire(key, ttl)
            .map_err(|e| Self::lease_error(key, format!("{:#}", e)))
    }

    async fn release(&self, lease: &Lease) -> Result<()> {
        self.release_sync(lease)
            .map_err(|e| Self::lease_error(lease.key(), format!("{:#}", e)))
    }
}
