//! Coordination channel errors.
//!
//! These cover failures of the channel itself. Business-level failure travels
//! inside [`ResponseEnvelope`](crate::envelope::ResponseEnvelope) and the
//! uniform no-target reason; it is never surfaced as a `HubError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Hub unavailable")]
    HubUnavailable,

    #[error("Reply channel closed before a response arrived")]
    ReplyDropped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_role_error() {
        let err = HubError::InvalidRole("picker".to_string());
        let display = err.to_string();
        assert!(display.contains("Invalid role"));
        assert!(display.contains("picker"));
    }

    #[test]
    fn test_hub_unavailable_error() {
        let err = HubError::HubUnavailable;
        assert!(err.to_string().contains("unavailable"));
    }

    #[test]
    fn test_reply_dropped_error() {
        let err = HubError::ReplyDropped;
        assert!(err.to_string().contains("Reply channel closed"));
    }

    #[test]
    fn test_error_debug() {
        let err = HubError::HubUnavailable;
        let debug = format!("{:?}", err);
        assert!(debug.contains("HubUnavailable"));
    }

    #[test]
    fn test_all_error_variants_display() {
        let errors: Vec<HubError> = vec![
            HubError::InvalidRole("a".to_string()),
            HubError::HubUnavailable,
            HubError::ReplyDropped,
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}
