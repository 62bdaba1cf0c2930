//! # Framemesh Hub
//!
//! The central coordination point of a framemesh deployment. The hub owns
//! the role registry and routes requests between execution contexts.
//!
//! ## Core Concepts
//!
//! - **Role**: A named capability ("trigger", "sorting") that contexts
//!   announce themselves under
//! - **Registry**: Who serves which role right now, with liveness tracking
//! - **Routing**: A request addressed to a role is delivered to exactly one
//!   context serving it, preferring one on the caller's host
//!
//! The hub runs as a single actor task. All state lives inside it and every
//! mutation arrives over its command channel, so readers never observe a
//! half-applied update. Clients hold a [`HubHandle`].

mod config;
mod handle;
mod hub;
mod registry;

pub use config::HubConfig;
pub use handle::HubHandle;
pub use hub::{Hub, HubCommand};
pub use registry::{RegistrySnapshot, RoleRegistry};
