//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no config");
        let err = ConfigError::from(io_err);
        assert!(err.to_string().contains("IO error"));
        assert!(err.to_string().contains("no config"));
    }

    #[test]
    fn test_toml_error_from() {
        let toml_err = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let err = ConfigError::from(toml_err);
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_env_var_not_set() {
        let err = ConfigError::EnvVarNotSet("FRAMEMESH_SECRET".to_string());
        assert_eq!(
            err.to_string(),
            "Environment variable not set: FRAMEMESH_SECRET"
        );
    }
}
