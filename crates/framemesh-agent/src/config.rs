//! Agent configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a context agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// How often to re-announce our role to the hub, in seconds.
    #[serde(default = "default_announce_interval_secs")]
    pub announce_interval_secs: u64,
    /// How often to ping the hub for liveness, in seconds.
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    /// How long a routed request may wait for its response, in seconds.
    #[serde(default = "default_route_timeout_secs")]
    pub route_timeout_secs: u64,
    /// Depth of the request delivery channel.
    #[serde(default = "default_delivery_buffer")]
    pub delivery_buffer: usize,
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

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            announce_interval_secs: default_announce_interval_secs(),
            ping_interval_secs: default_ping_interval_secs(),
            route_timeout_secs: default_route_timeout_secs(),
            delivery_buffer: default_delivery_buffer(),
        }
    }
}

impl AgentConfig {
    /// Announce cadence as a Duration.
    pub fn announce_interval(&self) -> Duration {
        Duration::from_secs(self.announce_interval_secs)
    }

    /// Ping cadence as a Duration.
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    /// Route timeout as a Duration.
    pub fn route_timeout(&self) -> Duration {
        Duration::from_secs(self.route_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.announce_interval(), Duration::from_secs(30));
        assert_eq!(config.ping_interval(), Duration::from_secs(10));
        assert_eq!(config.route_timeout(), Duration::from_secs(120));
        assert_eq!(config.delivery_buffer, 32);
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: AgentConfig = serde_json::from_str(r#"{"ping_interval_secs":3}"#).unwrap();
        assert_eq!(config.ping_interval_secs, 3);
        assert_eq!(config.announce_interval_secs, 30);
        assert_eq!(config.route_timeout_secs, 120);
    }
}
