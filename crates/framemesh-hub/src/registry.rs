//! Role registry: which contexts serve which roles, and how recently each
//! was heard from.
//!
//! The registry is plain owned state. It is only ever touched by the hub
//! actor task, which serializes every mutation, so nothing here locks.

use std::collections::HashMap;
use std::time::Duration;

use framemesh_protocols::{ContextId, HubError, InboundRequest, Role};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Per-context bookkeeping.
struct ContextMeta {
    /// Channel requests for this context are delivered on.
    delivery: mpsc::Sender<InboundRequest>,
    /// Last registration, ping, deliverable route, whichever came latest.
    last_seen: Instant,
}

/// Registry of live contexts grouped by role.
pub struct RoleRegistry {
    known_roles: Vec<Role>,
    /// Registration order per role; the router falls back to the oldest
    /// registrant when no same-host candidate exists.
    by_role: HashMap<Role, Vec<ContextId>>,
    contexts: HashMap<ContextId, ContextMeta>,
}

impl RoleRegistry {
    /// Create a registry accepting the given roles.
    pub fn new(known_roles: Vec<Role>) -> Self {
        let by_role = known_roles
            .iter()
            .map(|role| (role.clone(), Vec::new()))
            .collect();
        Self {
            known_roles,
            by_role,
            contexts: HashMap::new(),
        }
    }

    /// Record that `context` serves `role`.
    ///
    /// Re-registration is idempotent and doubles as a liveness refresh: the
    /// delivery channel is replaced and `last_seen` re-stamped, but the
    /// context keeps its position in the role's order.
    pub fn register(
        &mut self,
        role: &Role,
        context: ContextId,
        delivery: mpsc::Sender<InboundRequest>,
    ) -> Result<(), HubError> {
        if !self.known_roles.contains(role) {
            return Err(HubError::InvalidRole(role.to_string()));
        }

        self.contexts.insert(
            context.clone(),
            ContextMeta {
                delivery,
                last_seen: Instant::now(),
            },
        );

        let members = self.by_role.entry(role.clone()).or_default();
        if !members.contains(&context) {
            members.push(context);
        }
        Ok(())
    }

    /// Remove a context from every role. Returns whether it was present.
    pub fn remove(&mut self, context: &ContextId) -> bool {
        let present = self.contexts.remove(context).is_some();
        for members in self.by_role.values_mut() {
            members.retain(|member| member != context);
        }
        present
    }

    /// Refresh a context's liveness. Returns `false` for unknown contexts;
    /// a ping never creates a registration.
    pub fn touch(&mut self, context: &ContextId) -> bool {
        match self.contexts.get_mut(context) {
            Some(meta) => {
                meta.last_seen = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Whether any context currently serves `role`.
    pub fn is_registered(&self, role: &Role) -> bool {
        self.by_role
            .get(role)
            .map(|members| !members.is_empty())
            .unwrap_or(false)
    }

    /// Choose the single context a request for `role` goes to: a same-host
    /// candidate if one exists, otherwise the oldest registrant.
    pub fn pick_target(
        &self,
        role: &Role,
        from: &ContextId,
    ) -> Option<(ContextId, mpsc::Sender<InboundRequest>)> {
        let members = self.by_role.get(role)?;
        let target = members
            .iter()
            .find(|member| member.same_host(from))
            .or_else(|| members.first())?;
        let meta = self.contexts.get(target)?;
        Some((target.clone(), meta.delivery.clone()))
    }

    /// Evict every context silent for longer than `idle_threshold`.
    /// Returns the evicted ids.
    pub fn sweep(&mut self, idle_threshold: Duration, now: Instant) -> Vec<ContextId> {
        let evicted: Vec<ContextId> = self
            .contexts
            .iter()
            .filter(|(_, meta)| now.duration_since(meta.last_seen) > idle_threshold)
            .map(|(context, _)| context.clone())
            .collect();
        for context in &evicted {
            self.remove(context);
        }
        evicted
    }

    /// Drop every registration. Known roles stay configured.
    pub fn reset(&mut self) {
        self.contexts.clear();
        for members in self.by_role.values_mut() {
            members.clear();
        }
    }

    /// Point-in-time view of the registry.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            roles: self.by_role.clone(),
            total_contexts: self.contexts.len(),
        }
    }

    /// Number of live contexts.
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }
}

/// Point-in-time view of the registry contents.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    /// Members of each role, in registration order.
    pub roles: HashMap<Role, Vec<ContextId>>,
    /// Total distinct live contexts.
    pub total_contexts: usize,
}

impl RegistrySnapshot {
    /// How many contexts serve `role`.
    pub fn count(&self, role: &Role) -> usize {
        self.roles.get(role).map(|members| members.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RoleRegistry {
        RoleRegistry::new(vec![Role::new("trigger"), Role::new("sorting")])
    }

    fn delivery() -> mpsc::Sender<InboundRequest> {
        let (tx, _rx) = mpsc::channel(8);
        tx
    }

    fn ctx(host: &str, slot: &str) -> ContextId {
        ContextId::new(host, slot)
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = registry();
        let role = Role::new("sorting");

        assert!(!registry.is_registered(&role));
        registry
            .register(&role, ctx("tab1", "main"), delivery())
            .unwrap();
        assert!(registry.is_registered(&role));
        assert_eq!(registry.context_count(), 1);
    }

    #[test]
    fn test_register_unknown_role_rejected() {
        let mut registry = registry();
        let err = registry
            .register(&Role::new("payments"), ctx("tab1", "main"), delivery())
            .unwrap_err();
        assert!(matches!(err, HubError::InvalidRole(_)));
        assert_eq!(registry.context_count(), 0);
    }

    #[test]
    fn test_reregistration_keeps_single_membership() {
        let mut registry = registry();
        let role = Role::new("sorting");

        for _ in 0..3 {
            registry
                .register(&role, ctx("tab1", "main"), delivery())
                .unwrap();
        }

        assert_eq!(registry.snapshot().count(&role), 1);
        assert_eq!(registry.context_count(), 1);
    }

    #[test]
    fn test_one_context_may_serve_multiple_roles() {
        let mut registry = registry();
        let context = ctx("tab1", "main");

        registry
            .register(&Role::new("trigger"), context.clone(), delivery())
            .unwrap();
        registry
            .register(&Role::new("sorting"), context, delivery())
            .unwrap();

        assert_eq!(registry.snapshot().count(&Role::new("trigger")), 1);
        assert_eq!(registry.snapshot().count(&Role::new("sorting")), 1);
        assert_eq!(registry.context_count(), 1);
    }

    #[test]
    fn test_remove_clears_every_role() {
        let mut registry = registry();
        let context = ctx("tab1", "main");
        registry
            .register(&Role::new("trigger"), context.clone(), delivery())
            .unwrap();
        registry
            .register(&Role::new("sorting"), context.clone(), delivery())
            .unwrap();

        assert!(registry.remove(&context));

        assert!(!registry.is_registered(&Role::new("trigger")));
        assert!(!registry.is_registered(&Role::new("sorting")));
        assert_eq!(registry.context_count(), 0);

        // Removing again reports absence.
        assert!(!registry.remove(&context));
    }

    #[test]
    fn test_touch_unknown_context_does_not_create() {
        let mut registry = registry();
        assert!(!registry.touch(&ctx("tab1", "ghost")));
        assert_eq!(registry.context_count(), 0);
    }

    #[test]
    fn test_pick_target_prefers_same_host() {
        let mut registry = registry();
        let role = Role::new("sorting");
        registry
            .register(&role, ctx("tab9", "far"), delivery())
            .unwrap();
        registry
            .register(&role, ctx("tab1", "near"), delivery())
            .unwrap();

        let (target, _) = registry.pick_target(&role, &ctx("tab1", "caller")).unwrap();
        assert_eq!(target, ctx("tab1", "near"));
    }

    #[test]
    fn test_pick_target_falls_back_to_oldest_registrant() {
        let mut registry = registry();
        let role = Role::new("sorting");
        registry
            .register(&role, ctx("tab1", "first"), delivery())
            .unwrap();
        registry
            .register(&role, ctx("tab2", "second"), delivery())
            .unwrap();

        let (target, _) = registry.pick_target(&role, &ctx("tab9", "caller")).unwrap();
        assert_eq!(target, ctx("tab1", "first"));
    }

    #[test]
    fn test_pick_target_empty_role() {
        let registry = registry();
        assert!(registry
            .pick_target(&Role::new("sorting"), &ctx("tab1", "caller"))
            .is_none());
        assert!(registry
            .pick_target(&Role::new("payments"), &ctx("tab1", "caller"))
            .is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_only_past_threshold() {
        let mut registry = registry();
        let role = Role::new("sorting");
        registry
            .register(&role, ctx("tab1", "main"), delivery())
            .unwrap();
        let registered_at = Instant::now();
        let threshold = Duration::from_secs(3_600);

        // Exactly at the threshold is not yet idle.
        assert!(registry.sweep(threshold, registered_at + threshold).is_empty());

        let evicted = registry.sweep(
            threshold,
            registered_at + threshold + Duration::from_millis(1),
        );
        assert_eq!(evicted, vec![ctx("tab1", "main")]);
        assert!(!registry.is_registered(&role));
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_defers_eviction() {
        let mut registry = registry();
        let role = Role::new("sorting");
        registry
            .register(&role, ctx("tab1", "main"), delivery())
            .unwrap();
        let threshold = Duration::from_secs(3_600);

        tokio::time::advance(Duration::from_secs(3_000)).await;
        assert!(registry.touch(&ctx("tab1", "main")));

        tokio::time::advance(Duration::from_secs(1_000)).await;
        // 4000s since registration, 1000s since the ping.
        assert!(registry.sweep(threshold, Instant::now()).is_empty());
        assert_eq!(registry.context_count(), 1);
    }

    #[test]
    fn test_reset_keeps_known_roles() {
        let mut registry = registry();
        let role = Role::new("sorting");
        registry
            .register(&role, ctx("tab1", "main"), delivery())
            .unwrap();

        registry.reset();

        assert_eq!(registry.context_count(), 0);
        assert!(!registry.is_registered(&role));
        // The role is still accepted after the wipe.
        registry
            .register(&role, ctx("tab1", "again"), delivery())
            .unwrap();
        assert!(registry.is_registered(&role));
    }

    #[test]
    fn test_snapshot_counts() {
        let mut registry = registry();
        registry
            .register(&Role::new("sorting"), ctx("tab1", "a"), delivery())
            .unwrap();
        registry
            .register(&Role::new("sorting"), ctx("tab2", "b"), delivery())
            .unwrap();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.count(&Role::new("sorting")), 2);
        assert_eq!(snapshot.count(&Role::new("trigger")), 0);
        assert_eq!(snapshot.count(&Role::new("payments")), 0);
        assert_eq!(snapshot.total_contexts, 2);
    }
}
