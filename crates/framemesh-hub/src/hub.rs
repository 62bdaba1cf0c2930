//! The hub actor: serializes registry access and routes requests.

use std::time::Duration;

use framemesh_protocols::{
    ContextId, HubError, InboundRequest, RequestFrame, ResponseEnvelope, Role,
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::HubConfig;
use crate::handle::HubHandle;
use crate::registry::{RegistrySnapshot, RoleRegistry};

/// Commands accepted by the hub actor.
#[derive(Debug)]
pub enum HubCommand {
    /// Announce a context as serving a role.
    RoleReady {
        role: Role,
        context: ContextId,
        delivery: mpsc::Sender<InboundRequest>,
        reply: oneshot::Sender<Result<(), HubError>>,
    },
    /// Withdraw a context from every role.
    RoleBye { context: ContextId },
    /// Liveness refresh. Replies whether the context is known.
    Ping {
        context: ContextId,
        reply: oneshot::Sender<bool>,
    },
    /// Whether any context currently serves the role.
    CheckRoleRegistered {
        role: Role,
        reply: oneshot::Sender<bool>,
    },
    /// Deliver a request to exactly one context serving the role and relay
    /// its response.
    RouteToRole {
        from: ContextId,
        target_role: Role,
        frame: RequestFrame,
        timeout: Duration,
        reply: oneshot::Sender<ResponseEnvelope>,
    },
    /// Point-in-time registry contents.
    Snapshot {
        reply: oneshot::Sender<RegistrySnapshot>,
    },
    /// Drop every registration, keeping the hub running.
    Reset,
    /// Remove a context that failed delivery. Sent by the hub's own dispatch
    /// tasks ahead of the caller's reply, so later commands observe the
    /// eviction.
    Evict { context: ContextId },
}

/// The coordination hub.
///
/// Owns the [`RoleRegistry`]; every read and write arrives over the command
/// channel, so the registry needs no locking and observers never see a
/// half-applied update. Spawn one per deployment and hand out clones of the
/// returned [`HubHandle`].
pub struct Hub {
    config: HubConfig,
    registry: RoleRegistry,
    cmd_tx: mpsc::Sender<HubCommand>,
    cmd_rx: mpsc::Receiver<HubCommand>,
}

impl Hub {
    /// Spawn the hub actor. Returns a cloneable handle plus the actor task,
    /// which exits when `shutdown_rx` fires.
    pub fn spawn(
        config: HubConfig,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> (HubHandle, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer);
        let registry = RoleRegistry::new(config.known_roles());
        let hub = Self {
            config,
            registry,
            cmd_tx: cmd_tx.clone(),
            cmd_rx,
        };
        let task = tokio::spawn(hub.run(shutdown_rx));
        (HubHandle::new(cmd_tx), task)
    }

    async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut sweep = tokio::time::interval(self.config.sweep_interval());
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately against an empty registry.
        sweep.tick().await;

        info!(
            "Hub started (roles: {:?}, sweep every {:?})",
            self.config.roles,
            self.config.sweep_interval()
        );

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Hub shutting down");
                    break;
                }
                _ = sweep.tick() => {
                    self.sweep_idle();
                }
                Some(cmd) = self.cmd_rx.recv() => {
                    self.handle_command(cmd);
                }
            }
        }
    }

    fn handle_command(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::RoleReady {
                role,
                context,
                delivery,
                reply,
            } => {
                let result = self.registry.register(&role, context.clone(), delivery);
                match &result {
                    Ok(()) => info!(%role, %context, "context registered"),
                    Err(e) => warn!(%role, %context, error = %e, "registration rejected"),
                }
                let _ = reply.send(result);
            }
            HubCommand::RoleBye { context } => {
                if self.registry.remove(&context) {
                    info!(%context, "context deregistered");
                }
            }
            HubCommand::Ping { context, reply } => {
                let _ = reply.send(self.registry.touch(&context));
            }
            HubCommand::CheckRoleRegistered { role, reply } => {
                let _ = reply.send(self.registry.is_registered(&role));
            }
            HubCommand::RouteToRole {
                from,
                target_role,
                frame,
                timeout,
                reply,
            } => {
                self.route(from, target_role, frame, timeout, reply);
            }
            HubCommand::Snapshot { reply } => {
                let _ = reply.send(self.registry.snapshot());
            }
            HubCommand::Reset => {
                self.registry.reset();
                info!("registry reset, all registrations dropped");
            }
            HubCommand::Evict { context } => {
                if self.registry.remove(&context) {
                    warn!(%context, "context evicted after failed delivery");
                }
            }
        }
    }

    /// Pick the target and hand the wait off to a dispatch task, so slow
    /// responders never stall the command loop.
    fn route(
        &mut self,
        from: ContextId,
        target_role: Role,
        frame: RequestFrame,
        timeout: Duration,
        reply: oneshot::Sender<ResponseEnvelope>,
    ) {
        let Some((target, delivery)) = self.registry.pick_target(&target_role, &from) else {
            debug!(
                %target_role,
                %from,
                correlation = %frame.correlation_id,
                "no context serves role"
            );
            let _ = reply.send(ResponseEnvelope::no_target());
            return;
        };

        debug!(
            %target_role,
            %from,
            %target,
            same_host = target.same_host(&from),
            correlation = %frame.correlation_id,
            "routing request"
        );

        let cmd_tx = self.cmd_tx.clone();
        tokio::spawn(async move {
            match Self::dispatch(&delivery, frame, timeout).await {
                Ok(response) => {
                    let _ = reply.send(response);
                }
                Err(reason) => {
                    debug!(%target, reason, "delivery failed, evicting target");
                    // Enqueue the eviction before answering so commands sent
                    // after the reply observe it.
                    let _ = cmd_tx.send(HubCommand::Evict { context: target }).await;
                    let _ = reply.send(ResponseEnvelope::no_target());
                }
            }
        });
    }

    /// Deliver one frame and wait for the response. Any failure mode comes
    /// back as a reason string; the caller cannot distinguish them and is
    /// not meant to.
    async fn dispatch(
        delivery: &mpsc::Sender<InboundRequest>,
        frame: RequestFrame,
        timeout: Duration,
    ) -> Result<ResponseEnvelope, &'static str> {
        let (resp_tx, resp_rx) = oneshot::channel();
        let request = InboundRequest {
            frame,
            reply: resp_tx,
        };
        if delivery.send(request).await.is_err() {
            return Err("delivery channel closed");
        }
        match tokio::time::timeout(timeout, resp_rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err("request dropped without a response"),
            Err(_) => Err("no response before timeout"),
        }
    }

    fn sweep_idle(&mut self) {
        let threshold = self.config.idle_eviction_threshold();
        let evicted = self
            .registry
            .sweep(threshold, tokio::time::Instant::now());
        if evicted.is_empty() {
            debug!("sweep found no idle contexts");
            return;
        }
        for context in &evicted {
            info!(%context, "context evicted after more than {:?} of silence", threshold);
        }
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
