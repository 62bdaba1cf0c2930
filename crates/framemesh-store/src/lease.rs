//! Expiring lease locks over a shared store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::SharedStore;

/// Persisted state of a held lease.
///
/// `acquired_at` is re-stamped on every renewal, so liveness is always
/// measured from the most recent heartbeat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseRecord {
    /// Identity of the current holder.
    pub owner: Uuid,
    /// When the lease was last acquired or renewed.
    pub acquired_at: DateTime<Utc>,
}

/// Lock on a named resource, backed by a [`SharedStore`] key.
///
/// The store has no compare-and-swap, so acquisition is write-then-verify:
/// write our record, read it back, and claim ownership only if our record
/// survived. Two callers racing inside the verify window can still both
/// succeed; anything built on top must tolerate a rare double holder rather
/// than assume mutual exclusion is absolute.
///
/// A lease expires `ttl` after its last renewal. Holders that stop
/// heartbeating (crash, eviction) lose the resource without any cleanup.
#[derive(Clone)]
pub struct LeaseLock {
    store: Arc<dyn SharedStore>,
    resource: String,
    key: String,
    ttl: Duration,
}

impl LeaseLock {
    /// Create a lock on the named resource.
    pub fn new(store: Arc<dyn SharedStore>, resource: impl Into<String>, ttl: Duration) -> Self {
        let resource = resource.into();
        let key = format!("lock:{}", resource);
        Self {
            store,
            resource,
            key,
            ttl,
        }
    }

    /// The resource this lock guards.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Time after which an unrenewed lease is considered expired.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_live(&self, record: &LeaseRecord, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(record.acquired_at);
        match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => age < ttl,
            // A ttl too large for chrono never expires.
            Err(_) => true,
        }
    }

    /// Attempt a single acquisition. Returns the new owner id on success,
    /// `None` if another holder's lease is still live or we lost the
    /// verify race.
    pub async fn try_acquire(&self) -> Result<Option<Uuid>, StoreError> {
        if let Some(raw) = self.store.get(&self.key).await? {
            match serde_json::from_str::<LeaseRecord>(&raw) {
                Ok(record) if self.is_live(&record, Utc::now()) => return Ok(None),
                Ok(record) => {
                    debug!(
                        resource = %self.resource,
                        previous_owner = %record.owner,
                        "taking over expired lease"
                    );
                }
                Err(e) => {
                    warn!(
                        resource = %self.resource,
                        error = %e,
                        "unreadable lease record, treating as expired"
                    );
                }
            }
        }

        let owner = Uuid::new_v4();
        let record = LeaseRecord {
            owner,
            acquired_at: Utc::now(),
        };
        self.store
            .set(&self.key, &serde_json::to_string(&record)?)
            .await?;

        // Verify our write survived any concurrent claimant.
        let verified = match self.store.get(&self.key).await? {
            Some(raw) => serde_json::from_str::<LeaseRecord>(&raw)
                .map(|r| r.owner == owner)
                .unwrap_or(false),
            None => false,
        };

        if verified {
            Ok(Some(owner))
        } else {
            debug!(resource = %self.resource, "lost acquisition race");
            Ok(None)
        }
    }

    /// Re-stamp the lease if we still own it. Returns `false` when the
    /// lease is gone or held by someone else, in which case the caller
    /// should stop treating the resource as theirs.
    pub async fn renew(&self, owner: Uuid) -> Result<bool, StoreError> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(false);
        };
        let Ok(record) = serde_json::from_str::<LeaseRecord>(&raw) else {
            return Ok(false);
        };
        if record.owner != owner {
            return Ok(false);
        }

        let refreshed = LeaseRecord {
            owner,
            acquired_at: Utc::now(),
        };
        self.store
            .set(&self.key, &serde_json::to_string(&refreshed)?)
            .await?;
        Ok(true)
    }

    /// Delete the lease if we own it. Releasing a lease we no longer hold
    /// is a no-op, so release is always safe to call.
    pub async fn release(&self, owner: Uuid) -> Result<(), StoreError> {
        if let Some(raw) = self.store.get(&self.key).await? {
            if let Ok(record) = serde_json::from_str::<LeaseRecord>(&raw) {
                if record.owner == owner {
                    self.store.delete(&self.key).await?;
                }
            }
        }
        Ok(())
    }

    /// Acquire the lease and keep it alive with a background heartbeat.
    ///
    /// Returns `None` if the lease is currently held. On success the
    /// returned guard renews every `heartbeat` until stopped or dropped.
    pub async fn acquire(&self, heartbeat: Duration) -> Result<Option<LeaseGuard>, StoreError> {
        let Some(owner) = self.try_acquire().await? else {
            return Ok(None);
        };

        let lock = self.clone();
        let renewal = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(heartbeat);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately; we just acquired.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match lock.renew(owner).await {
                    Ok(true) => {}
                    Ok(false) => {
                        warn!(
                            resource = %lock.resource,
                            "lease no longer ours, stopping renewal"
                        );
                        break;
                    }
                    Err(e) => {
                        warn!(
                            resource = %lock.resource,
                            error = %e,
                            "lease renewal failed, stopping"
                        );
                        break;
                    }
                }
            }
        });

        Ok(Some(LeaseGuard {
            owner,
            lock: self.clone(),
            renewal,
        }))
    }
}

/// A held lease with automatic renewal.
pub struct LeaseGuard {
    owner: Uuid,
    lock: LeaseLock,
    renewal: JoinHandle<()>,
}

impl LeaseGuard {
    /// Identity under which the lease is held.
    pub fn owner(&self) -> Uuid {
        self.owner
    }

    /// Stop renewing and release the lease immediately.
    pub async fn stop(self) {
        self.renewal.abort();
        if let Err(e) = self.lock.release(self.owner).await {
            warn!(
                resource = %self.lock.resource,
                error = %e,
                "failed to release lease"
            );
        }
    }
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        // Release needs async store access, so a plainly dropped guard only
        // stops heartbeating and lets the record expire on its own.
        self.renewal.abort();
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
