//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::schema::FramemeshConfig;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<FramemeshConfig, ConfigError> {
        let content = fs::read_to_string(path)?;
        let expanded = Self::expand_env_vars(&content)?;
        let config: FramemeshConfig = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist. A file that exists but fails to parse is
    /// still an error.
    pub fn load_or_default(path: &Path) -> Result<FramemeshConfig, ConfigError> {
        if !path.exists() {
            return Ok(FramemeshConfig::default());
        }
        Self::load(path)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<FramemeshConfig, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: FramemeshConfig = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.framemesh`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }

    /// Default location of the configuration file.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".framemesh").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::StoreBackend;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.hub.sweep_interval_secs, 600);
        assert_eq!(config.lease.ttl_secs, 15);
    }

    #[test]
    fn test_load_basic_config() {
        let content = r#"
            [hub]
            roles = ["trigger", "sorting", "audit"]
            sweep_interval_secs = 120

            [lease]
            heartbeat_secs = 2
            ttl_secs = 6
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.hub.roles.len(), 3);
        assert_eq!(config.hub.sweep_interval_secs, 120);
        assert_eq!(config.lease.heartbeat_secs, 2);
        // Untouched sections keep their defaults.
        assert_eq!(config.agent.route_timeout_secs, 120);
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
            [hub]
            roles = ["trigger", "sorting"]
            sweep_interval_secs = 300
            idle_eviction_threshold_secs = 1800
            command_buffer = 64

            [agent]
            announce_interval_secs = 15
            ping_interval_secs = 5
            route_timeout_secs = 60
            delivery_buffer = 16

            [singleton]
            probe_timeout_ms = 1000
            contention_deadline_ms = 900

            [store]
            backend = "file"
            dir = "/tmp/framemesh-store"

            [log]
            level = "debug"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.hub.command_buffer, 64);
        assert_eq!(config.agent.ping_interval_secs, 5);
        assert_eq!(config.singleton.probe_timeout_ms, 1_000);
        assert_eq!(config.singleton.probe_tick_ms, 120);
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.store.dir.as_deref(), Some("/tmp/framemesh-store"));
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[agent]").unwrap();
        writeln!(file, "route_timeout_secs = 30").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.agent.route_timeout_secs, 30);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config =
            ConfigLoader::load_or_default(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(config.hub.sweep_interval_secs, 600);
    }

    #[test]
    fn test_load_or_default_broken_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "hub = [unclosed").unwrap();
        assert!(ConfigLoader::load_or_default(file.path()).is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let content = "invalid = [unclosed";
        let result = ConfigLoader::load_str(content);
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("FRAMEMESH_TEST_LEVEL", "trace");
        }
        let content = "[log]\nlevel = \"${FRAMEMESH_TEST_LEVEL}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.log.level, "trace");
        unsafe {
            std::env::remove_var("FRAMEMESH_TEST_LEVEL");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "[log]\nlevel = \"${NONEXISTENT_FRAMEMESH_VAR_12345}\"";
        let result = ConfigLoader::load_str(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let config = ConfigLoader::load_str("[log]\nlevel = \"warn\"").unwrap();
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_expand_path_no_tilde() {
        let path = "/usr/local/share/framemesh";
        assert_eq!(ConfigLoader::expand_path(path), path);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/store");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/store"));
    }

    #[test]
    fn test_default_config_path_under_home() {
        if let Some(path) = ConfigLoader::default_config_path() {
            assert!(path.ends_with(".framemesh/config.toml"));
        }
    }
}
