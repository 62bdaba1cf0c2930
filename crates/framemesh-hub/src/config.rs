//! Hub configuration.

use std::time::Duration;

use framemesh_protocols::Role;
use serde::{Deserialize, Serialize};

/// Configuration for the hub actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Roles the registry accepts. Announcements for anything else are
    /// rejected.
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
    /// How often the idle sweep runs, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Silence after which the sweep evicts a context, in seconds.
    #[serde(default = "default_idle_eviction_threshold_secs")]
    pub idle_eviction_threshold_secs: u64,
    /// Command channel depth.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
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

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            roles: default_roles(),
            sweep_interval_secs: default_sweep_interval_secs(),
            idle_eviction_threshold_secs: default_idle_eviction_threshold_secs(),
            command_buffer: default_command_buffer(),
        }
    }
}

impl HubConfig {
    /// Sweep cadence as a Duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Idle eviction threshold as a Duration.
    pub fn idle_eviction_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_eviction_threshold_secs)
    }

    /// The accepted roles as typed values.
    pub fn known_roles(&self) -> Vec<Role> {
        self.roles.iter().map(|r| Role::new(r.as_str())).collect()
    }
}
