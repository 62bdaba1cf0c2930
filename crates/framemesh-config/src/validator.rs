//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::FramemeshConfig;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &FramemeshConfig) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_hub(config, &mut result);
        Self::validate_agent(config, &mut result);
        Self::validate_lease(config, &mut result);
        Self::validate_singleton(config, &mut result);

        Ok(result)
    }

    fn validate_hub(config: &FramemeshConfig, result: &mut ValidationResult) {
        if config.hub.roles.is_empty() {
            result.add_error(ValidationError::new(
                "hub.roles",
                "At least one role must be configured",
            ));
        }

        for role in &config.hub.roles {
            if role.trim().is_empty() {
                result.add_error(ValidationError::new("hub.roles", "Role names cannot be empty"));
            }
        }

        if config.hub.command_buffer == 0 {
            result.add_error(ValidationError::new(
                "hub.command_buffer",
                "Command buffer must be greater than 0",
            ));
        }

        // A threshold at or below the agents' ping cadence would evict
        // healthy contexts between their own heartbeats.
        if config.hub.idle_eviction_threshold_secs <= config.agent.ping_interval_secs {
            result.add_warning(ValidationWarning::new(
                "hub.idle_eviction_threshold_secs",
                "Idle eviction threshold is not above agent.ping_interval_secs; live contexts may be swept",
            ));
        }
    }

    fn validate_agent(config: &FramemeshConfig, result: &mut ValidationResult) {
        if config.agent.route_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "agent.route_timeout_secs",
                "Route timeout must be greater than 0",
            ));
        }

        if config.agent.announce_interval_secs == 0 {
            result.add_error(ValidationError::new(
                "agent.announce_interval_secs",
                "Announce interval must be greater than 0",
            ));
        }

        if config.agent.ping_interval_secs == 0 {
            result.add_error(ValidationError::new(
                "agent.ping_interval_secs",
                "Ping interval must be greater than 0",
            ));
        }

        if config.agent.delivery_buffer == 0 {
            result.add_error(ValidationError::new(
                "agent.delivery_buffer",
                "Delivery buffer must be greater than 0",
            ));
        }
    }

    fn validate_lease(config: &FramemeshConfig, result: &mut ValidationResult) {
        if config.lease.heartbeat_secs == 0 {
            result.add_error(ValidationError::new(
                "lease.heartbeat_secs",
                "Lease heartbeat must be greater than 0",
            ));
        }

        if config.lease.ttl_secs <= config.lease.heartbeat_secs {
            result.add_error(ValidationError::new(
                "lease.ttl_secs",
                "Lease ttl must exceed the heartbeat, or the lease expires between renewals",
            ));
        } else if config.lease.ttl_secs < config.lease.heartbeat_secs * 2 {
            result.add_warning(ValidationWarning::new(
                "lease.ttl_secs",
                "Lease ttl below twice the heartbeat leaves no room for a single missed renewal",
            ));
        }
    }

    fn validate_singleton(config: &FramemeshConfig, result: &mut ValidationResult) {
        if config.singleton.probe_tick_ms == 0 {
            result.add_error(ValidationError::new(
                "singleton.probe_tick_ms",
                "Probe tick must be greater than 0",
            ));
        }

        if config.singleton.contention_poll_ms == 0 {
            result.add_error(ValidationError::new(
                "singleton.contention_poll_ms",
                "Contention poll must be greater than 0",
            ));
        }

        if config.singleton.contention_deadline_ms < config.singleton.contention_poll_ms {
            result.add_warning(ValidationWarning::new(
                "singleton.contention_deadline_ms",
                "Contention deadline below the poll cadence never polls even once",
            ));
        }

        if config.singleton.boot_ttl_ms == 0 {
            result.add_error(ValidationError::new(
                "singleton.boot_ttl_ms",
                "Boot lock ttl must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FramemeshConfig::default();
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_empty_roles_rejected() {
        let mut config = FramemeshConfig::default();
        config.hub.roles.clear();

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert_eq!(result.errors[0].path, "hub.roles");
    }

    #[test]
    fn test_zero_buffers_rejected() {
        let mut config = FramemeshConfig::default();
        config.hub.command_buffer = 0;
        config.agent.delivery_buffer = 0;

        let result = ConfigValidator::validate(&config).unwrap();
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_lease_ttl_must_exceed_heartbeat() {
        let mut config = FramemeshConfig::default();
        config.lease.heartbeat_secs = 10;
        config.lease.ttl_secs = 10;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert_eq!(result.errors[0].path, "lease.ttl_secs");
    }

    #[test]
    fn test_tight_lease_ttl_warns() {
        let mut config = FramemeshConfig::default();
        config.lease.heartbeat_secs = 10;
        config.lease.ttl_secs = 15;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].path, "lease.ttl_secs");
    }

    #[test]
    fn test_eviction_threshold_below_ping_warns() {
        let mut config = FramemeshConfig::default();
        config.hub.idle_eviction_threshold_secs = 5;
        config.agent.ping_interval_secs = 10;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.path == "hub.idle_eviction_threshold_secs")
        );
    }

    #[test]
    fn test_contention_deadline_below_poll_warns() {
        let mut config = FramemeshConfig::default();
        config.singleton.contention_poll_ms = 500;
        config.singleton.contention_deadline_ms = 100;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }
}
