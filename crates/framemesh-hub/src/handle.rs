//! Client handle for the hub actor.

use std::time::Duration;

use framemesh_protocols::{
    ContextId, HubError, InboundRequest, RequestFrame, ResponseEnvelope, Role,
};
use tokio::sync::{mpsc, oneshot};

use crate::hub::HubCommand;
use crate::registry::RegistrySnapshot;

/// Handle to a running [`Hub`](crate::Hub). Cheap to clone; every clone
/// talks to the same actor.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    pub(crate) fn new(tx: mpsc::Sender<HubCommand>) -> Self {
        Self { tx }
    }

    /// Register a context as serving `role`. Requests routed to the role
    /// arrive on the `delivery` channel. Registering again refreshes
    /// liveness and replaces the delivery channel.
    pub async fn register(
        &self,
        role: Role,
        context: ContextId,
        delivery: mpsc::Sender<InboundRequest>,
    ) -> Result<(), HubError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(HubCommand::RoleReady {
                role,
                context,
                delivery,
                reply,
            })
            .await
            .map_err(|_| HubError::HubUnavailable)?;
        rx.await.map_err(|_| HubError::ReplyDropped)?
    }

    /// Withdraw a context from every role. Fire and forget: contexts often
    /// deregister while tearing down, when nobody is left to read an error.
    pub async fn deregister(&self, context: ContextId) {
        let _ = self.tx.send(HubCommand::RoleBye { context }).await;
    }

    /// Refresh a context's liveness. Returns whether the hub knows it; a
    /// `false` tells the caller to re-register.
    pub async fn ping(&self, context: ContextId) -> Result<bool, HubError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(HubCommand::Ping { context, reply })
            .await
            .map_err(|_| HubError::HubUnavailable)?;
        rx.await.map_err(|_| HubError::ReplyDropped)
    }

    /// Whether any context currently serves `role`.
    pub async fn is_role_registered(&self, role: Role) -> Result<bool, HubError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(HubCommand::CheckRoleRegistered { role, reply })
            .await
            .map_err(|_| HubError::HubUnavailable)?;
        rx.await.map_err(|_| HubError::ReplyDropped)
    }

    /// Route a request to exactly one context serving `target_role` and
    /// wait for its response.
    ///
    /// Routing failures (nobody serves the role, the target is gone or
    /// silent) come back as an `ok: false` envelope with the uniform
    /// no-target reason, never as an `Err`. `Err` means the hub itself is
    /// unreachable.
    pub async fn route(
        &self,
        from: ContextId,
        target_role: Role,
        frame: RequestFrame,
        timeout: Duration,
    ) -> Result<ResponseEnvelope, HubError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(HubCommand::RouteToRole {
                from,
                target_role,
                frame,
                timeout,
                reply,
            })
            .await
            .map_err(|_| HubError::HubUnavailable)?;
        rx.await.map_err(|_| HubError::ReplyDropped)
    }

    /// Point-in-time view of the registry.
    pub async fn snapshot(&self) -> Result<RegistrySnapshot, HubError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(HubCommand::Snapshot { reply })
            .await
            .map_err(|_| HubError::HubUnavailable)?;
        rx.await.map_err(|_| HubError::ReplyDropped)
    }

    /// Drop every registration, keeping the hub running.
    pub async fn reset(&self) -> Result<(), HubError> {
        self.tx
            .send(HubCommand::Reset)
            .await
            .map_err(|_| HubError::HubUnavailable)
    }
}
