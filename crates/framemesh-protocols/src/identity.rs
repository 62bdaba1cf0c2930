//! Context identity and addressing types.
//!
//! Execution contexts are sandboxed script environments (one frame within one
//! host tab, one worker within one process). They cannot call each other
//! directly; the hub addresses them by [`ContextId`] and groups them by
//! [`Role`].

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;

/// Composite identity of one execution context.
///
/// `host` names the host process (e.g. a tab), `slot` the sub-context within
/// it (e.g. a frame). Kept as an explicit value type so host and slot ids can
/// never collide the way concatenated string keys can. Stable for the
/// context's lifetime; a reloaded context gets a fresh identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId {
    /// Host process id (tab-level).
    pub host: String,
    /// Sub-context id within the host (frame-level).
    pub slot: String,
}

impl ContextId {
    /// Create a new context identity.
    pub fn new(host: impl Into<String>, slot: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            slot: slot.into(),
        }
    }

    /// Whether two contexts live in the same host process.
    ///
    /// The router prefers same-host targets so requests stay local.
    pub fn same_host(&self, other: &ContextId) -> bool {
        self.host == other.host
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.slot)
    }
}

/// Logical category a context registers under (e.g. "trigger", "sorting").
///
/// Roles address routing targets generically: a requester routes to a role,
/// never to a specific context. The hub validates roles against its
/// configured set at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Create a role from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Role name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Token pairing a request with its eventual response.
///
/// Several routed requests from one context can be in flight at once;
/// responses carry no ordering guarantee, so the correlation id is the only
/// way to match them up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a fresh correlation id.
    pub fn generate() -> Self {
        Self(format!("c_{}", Uuid::new_v4().simple()))
    }

    /// Correlation id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
