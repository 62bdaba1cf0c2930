//! Exactly-once work per context.

use std::future::Future;

use dashmap::DashSet;
use framemesh_protocols::ContextId;
use tracing::debug;

/// Tracks which contexts a one-shot action has already run for.
///
/// Announcements and registrations repeat on a cadence, but some work must
/// happen once per context lifetime (seeding a freshly appeared context,
/// injecting a companion frame into a host). Callers gate that work through
/// [`run_once`] and call [`forget`] when the context goes away so a
/// replacement gets seeded again.
///
/// [`run_once`]: OnceTracker::run_once
/// [`forget`]: OnceTracker::forget
pub struct OnceTracker {
    seen: DashSet<ContextId>,
}

impl OnceTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
        }
    }

    /// Record the context. Returns `true` the first time, `false` after.
    pub fn mark_run(&self, context: &ContextId) -> bool {
        self.seen.insert(context.clone())
    }

    /// Whether the action already ran for this context.
    pub fn has_run(&self, context: &ContextId) -> bool {
        self.seen.contains(context)
    }

    /// Run `action` only on the first sighting of `context`. Returns whether
    /// it ran.
    ///
    /// The context is marked before the action starts, so a concurrent
    /// second caller skips rather than doubling the work.
    pub async fn run_once<F, Fut>(&self, context: &ContextId, action: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        if !self.mark_run(context) {
            debug!(%context, "one-shot action already ran, skipping");
            return false;
        }
        action().await;
        true
    }

    /// Forget a context so the action can run again for its successor.
    /// Returns whether it was known.
    pub fn forget(&self, context: &ContextId) -> bool {
        self.seen.remove(context).is_some()
    }

    /// Number of tracked contexts.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been tracked yet.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl Default for OnceTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn ctx(host: &str, slot: &str) -> ContextId {
        ContextId::new(host, slot)
    }

    #[test]
    fn test_mark_run_first_time_only() {
        let tracker = OnceTracker::new();
        let context = ctx("tab1", "frame1");

        assert!(tracker.mark_run(&context));
        assert!(!tracker.mark_run(&context));
        assert!(tracker.has_run(&context));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_distinct_contexts_tracked_separately() {
        let tracker = OnceTracker::new();

        assert!(tracker.mark_run(&ctx("tab1", "frame1")));
        assert!(tracker.mark_run(&ctx("tab1", "frame2")));
        assert!(tracker.mark_run(&ctx("tab2", "frame1")));
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn test_forget_allows_rerun() {
        let tracker = OnceTracker::new();
        let context = ctx("tab1", "frame1");

        assert!(tracker.mark_run(&context));
        assert!(tracker.forget(&context));
        assert!(!tracker.has_run(&context));
        assert!(tracker.mark_run(&context));

        // Forgetting an unknown context reports so.
        assert!(!tracker.forget(&ctx("tab9", "ghost")));
    }

    #[tokio::test]
    async fn test_run_once_runs_action_once() {
        let tracker = OnceTracker::new();
        let context = ctx("tab1", "frame1");
        let runs = Arc::new(AtomicU64::new(0));

        for _ in 0..3 {
            let counter = runs.clone();
            tracker
                .run_once(&context, move || async move {
                    counter.fetch_add(1, Ordering::Relaxed);
                })
                .await;
        }

        assert_eq!(runs.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_concurrent_run_once_single_execution() {
        let tracker = Arc::new(OnceTracker::new());
        let context = ctx("tab1", "frame1");
        let runs = Arc::new(AtomicU64::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let tracker = tracker.clone();
            let context = context.clone();
            let counter = runs.clone();
            handles.push(tokio::spawn(async move {
                tracker
                    .run_once(&context, move || async move {
                        counter.fetch_add(1, Ordering::Relaxed);
                    })
                    .await
            }));
        }

        let mut ran = 0;
        for handle in handles {
            if handle.await.unwrap() {
                ran += 1;
            }
        }

        assert_eq!(ran, 1);
        assert_eq!(runs.load(Ordering::Relaxed), 1);
    }
}
