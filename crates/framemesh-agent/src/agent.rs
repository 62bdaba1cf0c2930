//! Context agent: keeps one execution context registered and serving.

use std::sync::Arc;
use std::time::Duration;

use framemesh_hub::HubHandle;
use framemesh_protocols::{
    ContextId, HubError, InboundRequest, RequestFrame, RequestHandler, ResponseEnvelope, Role,
};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;

/// One execution context's connection to the hub.
///
/// The agent owns the registration lifecycle: initial announcement, periodic
/// re-announcement (which heals a hub reset, since announcing is idempotent),
/// liveness pings, and dispatching delivered requests to the handler.
pub struct ContextAgent {
    context: ContextId,
    role: Role,
    hub: HubHandle,
    config: AgentConfig,
    handler: Arc<dyn RequestHandler>,
}

impl ContextAgent {
    /// Create an agent for `context` serving `role`.
    pub fn new(
        context: ContextId,
        role: Role,
        hub: HubHandle,
        config: AgentConfig,
        handler: Arc<dyn RequestHandler>,
    ) -> Self {
        Self {
            context,
            role,
            hub,
            config,
            handler,
        }
    }

    /// Register with the hub and start the agent loop.
    ///
    /// Fails if the initial registration is rejected. After that, transient
    /// hub trouble is absorbed and retried on the announce cadence instead
    /// of surfacing.
    pub async fn spawn(
        self,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<AgentHandle, HubError> {
        let (delivery_tx, delivery_rx) = mpsc::channel(self.config.delivery_buffer);

        self.hub
            .register(self.role.clone(), self.context.clone(), delivery_tx.clone())
            .await?;
        info!(context = %self.context, role = %self.role, "agent registered");

        let context = self.context.clone();
        let role = self.role.clone();
        let hub = self.hub.clone();
        let route_timeout = self.config.route_timeout();
        let task = tokio::spawn(self.run(delivery_tx, delivery_rx, shutdown_rx));

        Ok(AgentHandle {
            context,
            role,
            hub,
            route_timeout,
            task,
        })
    }

    async fn run(
        self,
        delivery_tx: mpsc::Sender<InboundRequest>,
        mut delivery_rx: mpsc::Receiver<InboundRequest>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let mut announce = tokio::time::interval(self.config.announce_interval());
        announce.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ping = tokio::time::interval(self.config.ping_interval());
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Both tick immediately and we just registered, so swallow those.
        announce.tick().await;
        ping.tick().await;

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(context = %self.context, "agent shutting down");
                    self.hub.deregister(self.context.clone()).await;
                    break;
                }
                _ = announce.tick() => {
                    if let Err(e) = self
                        .hub
                        .register(self.role.clone(), self.context.clone(), delivery_tx.clone())
                        .await
                    {
                        warn!(context = %self.context, error = %e, "re-announcement failed");
                    }
                }
                _ = ping.tick() => {
                    match self.hub.ping(self.context.clone()).await {
                        Ok(true) => {}
                        Ok(false) => {
                            debug!(context = %self.context, "hub lost our registration, waiting for next announce");
                        }
                        Err(e) => warn!(context = %self.context, error = %e, "ping failed"),
                    }
                }
                Some(request) = delivery_rx.recv() => {
                    // Handlers run detached so one slow request cannot back
                    // up the delivery channel.
                    let handler = self.handler.clone();
                    tokio::spawn(async move {
                        let response = handler.handle(request.frame).await;
                        let _ = request.reply.send(response);
                    });
                }
            }
        }
    }
}

/// Handle to a running agent.
#[derive(Debug)]
pub struct AgentHandle {
    context: ContextId,
    role: Role,
    hub: HubHandle,
    route_timeout: Duration,
    task: JoinHandle<()>,
}

impl AgentHandle {
    /// This agent's context identity.
    pub fn context(&self) -> &ContextId {
        &self.context
    }

    /// The role this agent serves.
    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Route a request to one context serving `target_role`, waiting up to
    /// the configured route timeout for its response.
    pub async fn route(
        &self,
        target_role: Role,
        kind: impl Into<String>,
        payload: Value,
    ) -> Result<ResponseEnvelope, HubError> {
        self.route_with_timeout(target_role, kind, payload, self.route_timeout)
            .await
    }

    /// Route with an explicit timeout instead of the configured one.
    pub async fn route_with_timeout(
        &self,
        target_role: Role,
        kind: impl Into<String>,
        payload: Value,
        timeout: Duration,
    ) -> Result<ResponseEnvelope, HubError> {
        let frame = RequestFrame::new(kind, payload);
        debug!(
            from = %self.context,
            %target_role,
            correlation = %frame.correlation_id,
            "routing request"
        );
        self.hub
            .route(self.context.clone(), target_role, frame, timeout)
            .await
    }

    /// Wait for the agent loop to finish. It exits after the shutdown
    /// signal, once the deregistration has been sent.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
