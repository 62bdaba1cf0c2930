//! Single-instance adoption across concurrent initializers.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::lease::LeaseLock;

/// Timings for the adoption protocol, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdoptionConfig {
    /// How long to wait for an existing instance before trying the lock.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Poll cadence while probing.
    #[serde(default = "default_probe_tick_ms")]
    pub probe_tick_ms: u64,
    /// Poll cadence while another initializer holds the boot lock.
    #[serde(default = "default_contention_poll_ms")]
    pub contention_poll_ms: u64,
    /// How long to wait out a contended boot lock.
    #[serde(default = "default_contention_deadline_ms")]
    pub contention_deadline_ms: u64,
    /// Expiry for the boot lock itself.
    #[serde(default = "default_boot_ttl_ms")]
    pub boot_ttl_ms: u64,
}

fn default_probe_timeout_ms() -> u64 {
    3_000
}

fn default_probe_tick_ms() -> u64 {
    120
}

fn default_contention_poll_ms() -> u64 {
    150
}

fn default_contention_deadline_ms() -> u64 {
    1_500
}

fn default_boot_ttl_ms() -> u64 {
    8_000
}

impl Default for AdoptionConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout_ms(),
            probe_tick_ms: default_probe_tick_ms(),
            contention_poll_ms: default_contention_poll_ms(),
            contention_deadline_ms: default_contention_deadline_ms(),
            boot_ttl_ms: default_boot_ttl_ms(),
        }
    }
}

impl AdoptionConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn probe_tick(&self) -> Duration {
        Duration::from_millis(self.probe_tick_ms)
    }

    pub fn contention_poll(&self) -> Duration {
        Duration::from_millis(self.contention_poll_ms)
    }

    pub fn contention_deadline(&self) -> Duration {
        Duration::from_millis(self.contention_deadline_ms)
    }

    pub fn boot_ttl(&self) -> Duration {
        Duration::from_millis(self.boot_ttl_ms)
    }
}

/// Slot holding at most one shared instance of `T`.
///
/// Concurrent initializers coordinate through [`get_or_init`]: whoever wins
/// the boot lock constructs the instance, everyone else adopts it. The slot
/// keeps the first published instance; later candidates are discarded. When
/// the boot lock stays contended past the deadline, construction proceeds
/// anyway so that startup can never deadlock on a wedged holder, at the cost
/// of a possible duplicate instance. Those builds are counted in
/// [`fallback_builds`].
///
/// [`get_or_init`]: SingletonSlot::get_or_init
/// [`fallback_builds`]: SingletonSlot::fallback_builds
pub struct SingletonSlot<T> {
    tx: watch::Sender<Option<T>>,
    fallback_builds: AtomicU64,
}

impl<T: Clone + Send + Sync + 'static> SingletonSlot<T> {
    /// Create an empty slot.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            tx,
            fallback_builds: AtomicU64::new(0),
        }
    }

    /// The current instance, if one has been published.
    pub fn current(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    /// Publish an instance into an empty slot. Returns `false` and discards
    /// the candidate when the slot is already occupied.
    pub fn publish(&self, value: T) -> bool {
        let published = self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(value);
            true
        });
        if !published {
            debug!("instance slot already occupied, discarding later candidate");
        }
        published
    }

    /// Wait up to `timeout` for an instance to appear, re-checking at least
    /// every `tick`.
    pub async fn wait_ready(&self, timeout: Duration, tick: Duration) -> Option<T> {
        let mut rx = self.tx.subscribe();
        if let Some(existing) = rx.borrow_and_update().clone() {
            return Some(existing);
        }

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return self.current();
            }
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        return self.current();
                    }
                    if let Some(instance) = rx.borrow_and_update().clone() {
                        return Some(instance);
                    }
                }
                _ = tokio::time::sleep(tick.min(remaining)) => {
                    if let Some(instance) = self.current() {
                        return Some(instance);
                    }
                }
            }
        }
    }

    /// Times construction proceeded without holding the boot lock.
    pub fn fallback_builds(&self) -> u64 {
        self.fallback_builds.load(Ordering::Relaxed)
    }

    /// Resolve the singleton: adopt an existing instance when one appears,
    /// construct under the boot lock otherwise.
    ///
    /// The sequence is probe, lock, wait out contention, one last lock
    /// attempt, then construct regardless. Every exit publishes into the
    /// slot, and the slot's first instance is what all callers get.
    pub async fn get_or_init<F, Fut>(
        &self,
        lock: &LeaseLock,
        config: &AdoptionConfig,
        build: F,
    ) -> Result<T, StoreError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = T> + Send,
    {
        if let Some(existing) = self.current() {
            return Ok(existing);
        }

        // A healthy builder publishes well inside the probe window.
        if let Some(existing) = self
            .wait_ready(config.probe_timeout(), config.probe_tick())
            .await
        {
            debug!(resource = %lock.resource(), "adopted existing instance");
            return Ok(existing);
        }

        if let Some(owner) = lock.try_acquire().await? {
            let instance = build().await;
            self.publish(instance.clone());
            lock.release(owner).await?;
            return Ok(self.current().unwrap_or(instance));
        }

        // Someone else is booting; give them until the deadline.
        let deadline = tokio::time::Instant::now() + config.contention_deadline();
        while tokio::time::Instant::now() < deadline {
            tokio::time::sleep(config.contention_poll()).await;
            if let Some(existing) = self.current() {
                debug!(resource = %lock.resource(), "adopted instance built under contention");
                return Ok(existing);
            }
        }

        // Last chance at the lock before building regardless.
        if let Some(owner) = lock.try_acquire().await? {
            let instance = build().await;
            self.publish(instance.clone());
            lock.release(owner).await?;
            return Ok(self.current().unwrap_or(instance));
        }

        warn!(
            resource = %lock.resource(),
            "boot lock still contended past deadline, constructing anyway"
        );
        self.fallback_builds.fetch_add(1, Ordering::Relaxed);
        let instance = build().await;
        self.publish(instance.clone());
        Ok(self.current().unwrap_or(instance))
    }
}

impl<T: Clone + Send + Sync + 'static> Default for SingletonSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "singleton_tests.rs"]
mod tests;
