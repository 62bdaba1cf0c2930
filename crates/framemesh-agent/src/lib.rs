//! # Framemesh Agent
//!
//! The context-side half of framemesh. A [`ContextAgent`] keeps one
//! execution context present in the hub's registry: it announces the
//! context's role, re-announces on a cadence (so a hub reset heals itself),
//! pings for liveness, and feeds delivered requests to a [`RequestHandler`].
//!
//! [`OnceTracker`] covers the companion problem of per-context one-shot
//! work, such as seeding a context the first time it appears.
//!
//! [`RequestHandler`]: framemesh_protocols::RequestHandler

mod agent;
mod config;
mod once;

pub use agent::{AgentHandle, ContextAgent};
pub use config::AgentConfig;
pub use once::OnceTracker;
