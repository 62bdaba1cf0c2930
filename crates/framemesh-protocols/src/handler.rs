//! Request handler trait.

use async_trait::async_trait;

use crate::envelope::{RequestFrame, ResponseEnvelope};

/// Serves requests routed to this context's role.
///
/// Implemented by the business collaborator (DOM automation, form filling,
/// etc.). The coordination layer forwards frames opaquely and relays whatever
/// envelope the handler returns; business failures belong inside the envelope
/// (`ok: false`), not in a Rust error.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handle one routed request and produce its response.
    async fn handle(&self, frame: RequestFrame) -> ResponseEnvelope;
}
