//! # Framemesh Protocols
//!
//! Shared definitions for the framemesh coordination layer.
//! Contains the identity types, message envelopes, and handler traits that
//! the hub, agents, and collaborators exchange - no implementations.
//!
//! ## Core Types
//!
//! - [`ContextId`] - Composite identity of one execution context (host + slot)
//! - [`Role`] - Logical category a context registers under
//! - [`RequestFrame`] / [`ResponseEnvelope`] - The routed request/response shapes
//! - [`RequestHandler`] - Trait a context implements to serve routed requests
//! - [`HubError`] - Failures of the coordination channel itself

pub mod envelope;
pub mod error;
pub mod handler;
pub mod identity;

pub use envelope::{InboundRequest, RequestFrame, ResponseEnvelope, REASON_NO_TARGET};
pub use error::HubError;
pub use handler::RequestHandler;
pub use identity::{ContextId, CorrelationId, Role};
