//! Event-matcher-filtered reconcile wrapper (§4.G).

use crate::runtime::controller::{ReconcileContext, ReconcileFn};
use crate::runtime::error::ReconcileError;
use crate::types::{EventMatcher, ResourceEvent, ResourceMeta};

/// Wraps a reconcile function with a list of [`EventMatcher`]s. Matchers
/// AND their populated fields and OR across the list; the wrapped function
/// is invoked with only the matching events, and skipped entirely when
/// none match.
pub struct Subscription<T> {
    matchers: Vec<EventMatcher>,
    reconcile: ReconcileFn<T>,
}

impl<T: ResourceMeta + Clone + Send + Sync + 'static> Subscription<T> {
    pub fn new(matchers: Vec<EventMatcher>, reconcile: ReconcileFn<T>) -> Self {
        Self { matchers, reconcile }
    }

    fn matches(&self, event: &ResourceEvent<T>) -> bool {
        if self.matchers.is_empty() {
            return true;
        }
        let namespace = Self::subject(event).and_then(|s| s.namespace());
        let name = Self::subject(event).map(|s| s.name());
        self.matchers.iter().any(|m| m.matches(event, namespace, name))
    }

    fn subject(event: &ResourceEvent<T>) -> Option<&T> {
        event.new.as_ref().or(event.old.as_ref())
    }

    /// Filter `ctx.events` against the matcher list; if the result is
    /// non-empty, invoke the wrapped reconcile function with only those
    /// events, otherwise skip it and return `None`.
    pub async fn dispatch(&self, ctx: ReconcileContext<T>) -> Option<ReconcileError> {
        let filtered: Vec<ResourceEvent<T>> = ctx.events.iter().filter(|e| self.matches(e)).cloned().collect();
        if filtered.is_empty() {
            return None;
        }
        let filtered_ctx = ReconcileContext {
            events: filtered,
            topology: ctx.topology,
            carryover: ctx.carryover,
            state: ctx.state,
        };
        (self.reconcile)(filtered_ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{Topology, TopologyOptions};
    use crate::types::{EventKind, GroupKind};
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    #[derive(Debug, Clone)]
    struct Obj {
        ns: Option<String>,
        name: String,
    }

    impl ResourceMeta for Obj {
        fn id(&self) -> Uuid {
            Uuid::nil()
        }
        fn group_kind(&self) -> &GroupKind {
            static GK: std::sync::OnceLock<GroupKind> = std::sync::OnceLock::new();
            GK.get_or_init(|| GroupKind::core("Obj"))
        }
        fn namespace(&self) -> Option<&str> {
            self.ns.as_deref()
        }
        fn name(&self) -> &str {
            &self.name
        }
        fn creation_timestamp(&self) -> DateTime<Utc> {
            Utc::now()
        }
        fn generation(&self) -> u64 {
            1
        }
    }

    fn ctx(events: Vec<ResourceEvent<Obj>>) -> ReconcileContext<Obj> {
        let (topo, _) = Topology::build(vec![], vec![], vec![], &[], TopologyOptions::default()).unwrap();
        ReconcileContext {
            events,
            topology: Arc::new(topo),
            carryover: None,
            state: Arc::new(parking_lot::Mutex::new(std::collections::HashMap::new())),
        }
    }

    #[tokio::test]
    async fn empty_matcher_list_matches_everything() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let sub = Subscription::new(
            vec![],
            Arc::new(move |ctx: ReconcileContext<Obj>| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                assert_eq!(ctx.events.len(), 1);
                Box::pin(async { None })
            }),
        );
        let event = ResourceEvent::create(GroupKind::core("Obj"), Obj { ns: None, name: "a".into() });
        sub.dispatch(ctx(vec![event])).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_matching_events_are_skipped_entirely() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let sub = Subscription::new(
            vec![EventMatcher {
                event_kind: Some(EventKind::Delete),
                ..Default::default()
            }],
            Arc::new(move |_ctx| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                Box::pin(async { None })
            }),
        );
        let event = ResourceEvent::create(GroupKind::core("Obj"), Obj { ns: None, name: "a".into() });
        sub.dispatch(ctx(vec![event])).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn matchers_or_across_the_list() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let sub = Subscription::new(
            vec![
                EventMatcher {
                    name: Some("a".into()),
                    ..Default::default()
                },
                EventMatcher {
                    name: Some("b".into()),
                    ..Default::default()
                },
            ],
            Arc::new(move |ctx: ReconcileContext<Obj>| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                assert_eq!(ctx.events.len(), 2);
                Box::pin(async { None })
            }),
        );
        let events = vec![
            ResourceEvent::create(GroupKind::core("Obj"), Obj { ns: None, name: "a".into() }),
            ResourceEvent::create(GroupKind::core("Obj"), Obj { ns: None, name: "b".into() }),
            ResourceEvent::create(GroupKind::core("Obj"), Obj { ns: None, name: "c".into() }),
        ];
        sub.dispatch(ctx(events)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
