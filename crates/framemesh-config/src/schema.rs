//! Configuration schema definitions.
//!
//! The schema mirrors the per-crate configuration structs (hub, agent,
//! adoption timings) so that a deployment is described by one TOML file;
//! the binary maps each section onto the owning crate's config at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FramemeshConfig {
    #[serde(default)]
    pub hub: HubSettings,

    #[serde(default)]
    pub agent: AgentSettings,

    #[serde(default)]
    pub lease: LeaseSettings,

    #[serde(default)]
    pub singleton: SingletonSettings,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub log: LogSettings,
}

/// Hub settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSettings {
    /// Roles the hub accepts registrations for.
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,

    /// Idle sweep cadence, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Silence after which the sweep evicts a context, in seconds.
    #[serde(default = "default_idle_eviction_threshold_secs")]
    pub idle_eviction_threshold_secs: u64,

    /// Command channel depth.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            roles: default_roles(),
            sweep_interval_secs: default_sweep_interval_secs(),
            idle_eviction_threshold_secs: default_idle_eviction_threshold_secs(),
            command_buffer: default_command_buffer(),
        }
    }
}

fn default_roles() -> Vec<String> {
    vec!["trigger".to_string(), "sorting".to_string()]
}

fn default_sweep_interval_secs() -> u64 {
    600
}

fn default_idle_eviction_threshold_secs() -> u64 {
    3_600
}

fn default_command_buffer() -> usize {
    128
}

/// Agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Role re-announcement cadence, in seconds.
    #[serde(default = "default_announce_interval_secs")]
    pub announce_interval_secs: u64,

    /// Liveness ping cadence, in seconds.
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    /// How long a routed request may wait for its response, in seconds.
    #[serde(default = "default_route_timeout_secs")]
    pub route_timeout_secs: u64,

    /// Request delivery channel depth.
    #[serde(default = "default_delivery_buffer")]
    pub delivery_buffer: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            announce_interval_secs: default_announce_interval_secs(),
            ping_interval_secs: default_ping_interval_secs(),
            route_timeout_secs: default_route_timeout_secs(),
            delivery_buffer: default_delivery_buffer(),
        }
    }
}

fn default_announce_interval_secs() -> u64 {
    30
}

fn default_ping_interval_secs() -> u64 {
    10
}

fn default_route_timeout_secs() -> u64 {
    120
}

fn default_delivery_buffer() -> usize {
    32
}

/// Lease lock settings for long-lived resource ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseSettings {
    /// Renewal cadence, in seconds.
    #[serde(default = "default_lease_heartbeat_secs")]
    pub heartbeat_secs: u64,

    /// Expiry of an unrenewed lease, in seconds.
    #[serde(default = "default_lease_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for LeaseSettings {
    fn default() -> Self {
        Self {
            heartbeat_secs: default_lease_heartbeat_secs(),
            ttl_secs: default_lease_ttl_secs(),
        }
    }
}

fn default_lease_heartbeat_secs() -> u64 {
    5
}

fn default_lease_ttl_secs() -> u64 {
    15
}

impl LeaseSettings {
    /// Renewal cadence as a Duration.
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    /// Lease expiry as a Duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Singleton adoption timings, in milliseconds. Mirrors the adoption
/// protocol's own config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingletonSettings {
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    #[serde(default = "default_probe_tick_ms")]
    pub probe_tick_ms: u64,

    #[serde(default = "default_contention_poll_ms")]
    pub contention_poll_ms: u64,

    #[serde(default = "default_contention_deadline_ms")]
    pub contention_deadline_ms: u64,

    #[serde(default = "default_boot_ttl_ms")]
    pub boot_ttl_ms: u64,
}

impl Default for SingletonSettings {
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

/// Shared store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Which backend holds shared state.
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,

    /// Directory for the file backend. Defaults to `~/.framemesh/store`
    /// when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            dir: None,
        }
    }
}

/// Shared store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local, for tests and single-process runs.
    Memory,
    /// One JSON file per key, shared between processes on a machine.
    File,
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::Memory
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// Default log level when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file directory. Defaults to `~/.framemesh/logs` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
