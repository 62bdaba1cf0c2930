//! Message envelopes exchanged over the coordination channel.
//!
//! A requester wraps its payload in a [`RequestFrame`]; the hub forwards the
//! frame verbatim to exactly one target context and relays back a single
//! [`ResponseEnvelope`]. Payloads stay opaque JSON - the coordination layer
//! never interprets them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::identity::CorrelationId;

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;

/// Failure reason reported whenever a route finds no reachable target.
///
/// One uniform reason regardless of why the peer was unreachable (never
/// registered, registered-but-gone, or registered-but-silent), so callers
/// have a single failure branch.
pub const REASON_NO_TARGET: &str = "no-target-frames";

/// A request as forwarded to the chosen target context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestFrame {
    /// Request kind (e.g. "barcode-request"); meaningful only to the handler.
    pub kind: String,
    /// Token for matching the eventual response.
    pub correlation_id: CorrelationId,
    /// Opaque payload, forwarded verbatim.
    #[serde(default)]
    pub payload: Value,
}

impl RequestFrame {
    /// Create a frame with a freshly generated correlation id.
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            correlation_id: CorrelationId::generate(),
            payload,
        }
    }

    /// Create a frame with an explicit correlation id.
    pub fn with_correlation(
        kind: impl Into<String>,
        correlation_id: CorrelationId,
        payload: Value,
    ) -> Self {
        Self {
            kind: kind.into(),
            correlation_id,
            payload,
        }
    }
}

/// Outcome of a routed request.
///
/// Produced by the responder, or synthesized by the hub when no responder is
/// available. The hub relays responder envelopes unchanged, including
/// business failures (`ok: false` with a responder-chosen reason).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Whether the request succeeded.
    pub ok: bool,
    /// Failure reason, when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Response payload, when the responder produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResponseEnvelope {
    /// Successful response carrying data.
    pub fn ok(data: Value) -> Self {
        Self {
            ok: true,
            reason: None,
            data: Some(data),
        }
    }

    /// Successful response with no payload.
    pub fn ok_empty() -> Self {
        Self {
            ok: true,
            reason: None,
            data: None,
        }
    }

    /// Failed response with a reason.
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
            data: None,
        }
    }

    /// The uniform "no reachable target" failure.
    pub fn no_target() -> Self {
        Self::fail(REASON_NO_TARGET)
    }

    /// Whether this is the uniform no-target failure.
    pub fn is_no_target(&self) -> bool {
        !self.ok && self.reason.as_deref() == Some(REASON_NO_TARGET)
    }
}

/// A routed request as delivered to the target context, paired with the
/// channel its reply travels back on.
///
/// The reply sender resolves the requester's pending route exactly once;
/// dropping it unanswered lets the hub's timeout synthesize the failure.
#[derive(Debug)]
pub struct InboundRequest {
    /// The forwarded frame.
    pub frame: RequestFrame,
    /// Where the handler's response goes.
    pub reply: oneshot::Sender<ResponseEnvelope>,
}
