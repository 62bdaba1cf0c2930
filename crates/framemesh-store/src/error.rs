//! Store errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err = StoreError::from(io_err);
        assert!(err.to_string().contains("missing file"));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_serialize_error_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let err = StoreError::from(json_err);
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_invalid_key_error() {
        let err = StoreError::InvalidKey("".to_string());
        assert!(err.to_string().contains("Invalid key"));
    }

    #[test]
    fn test_error_debug() {
        let err = StoreError::InvalidKey("x".to_string());
        assert!(format!("{:?}", err).contains("InvalidKey"));
    }
}
