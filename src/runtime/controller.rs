//! The controller: cache, topology snapshot, runnables, and the
//! per-mutation reconciliation algorithm (§4.F, §5).

use super::error::ReconcileError;
use super::runnable::{wait_for_stop, Runnable};
use crate::cache::Cache;
use crate::topology::{ConstructionError, Topology, TopologyWarning};
use crate::types::{EventKind, GroupKind, ResourceEvent, ResourceMeta};
use futures::future::BoxFuture;
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tracing::{instrument, warn};

/// Process-wide mutable bookkeeping map handed to every reconcile
/// invocation (§4.F: "a process-wide mutable state map for user
/// bookkeeping"). Concurrent writers within one task group are
/// responsible for their own key-level discipline (§5).
pub type StateMap = Arc<SyncMutex<HashMap<String, serde_json::Value>>>;

/// Everything a reconcile function is invoked with (§4.F step 4).
pub struct ReconcileContext<T> {
    pub events: Vec<ResourceEvent<T>>,
    pub topology: Arc<Topology>,
    pub carryover: Option<ReconcileError>,
    pub state: StateMap,
}

/// A user reconcile function: `Fn(ReconcileContext<T>) -> Option<ReconcileError>`.
pub type ReconcileFn<T> =
    Arc<dyn Fn(ReconcileContext<T>) -> BoxFuture<'static, Option<ReconcileError>> + Send + Sync>;

/// Rebuilds a [`Topology`] from a cache snapshot; supplied by the
/// embedder, typically backed by [`crate::gateway::GatewayApiBuilder`]
/// (kept out of this module so the runtime stays schema-agnostic, §1).
pub type TopologyBuilderFn<T> = Arc<
    dyn Fn(crate::cache::Snapshot<T>) -> Result<(Topology, Vec<TopologyWarning>), ConstructionError> + Send + Sync,
>;

#[derive(Debug, Error)]
pub enum StartError {
    #[error("runnable {0:?} did not sync within the configured timeout")]
    SyncTimeout(Vec<String>),
}

/// Timeouts and knobs for [`Controller::start`] (ambient, §10).
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub sync_timeout: Duration,
    pub sync_poll_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            sync_timeout: Duration::from_secs(30),
            sync_poll_interval: Duration::from_millis(50),
        }
    }
}

/// Owns the cache, the current topology snapshot, the runnables, the
/// user reconcile function, and a derived logger/tracer context (§4.F).
pub struct Controller<T: ResourceMeta + Clone + Send + Sync + 'static> {
    cache: Arc<dyn Cache<T>>,
    topology: AsyncMutex<Option<Arc<Topology>>>,
    /// Serializes `cache.mutate -> topology.rebuild` (§5) across
    /// concurrent callers; released before `reconcile` user code runs, so
    /// it never holds up later mutations while one reconcile is in flight
    /// (§9).
    dispatch_guard: AsyncMutex<()>,
    topology_builder: TopologyBuilderFn<T>,
    reconcile: ReconcileFn<T>,
    state: StateMap,
    config: ControllerConfig,
}

impl<T: ResourceMeta + Clone + Send + Sync + 'static> Controller<T> {
    pub fn new(
        cache: Arc<dyn Cache<T>>,
        topology_builder: TopologyBuilderFn<T>,
        reconcile: ReconcileFn<T>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            cache,
            topology: AsyncMutex::new(None),
            dispatch_guard: AsyncMutex::new(()),
            topology_builder,
            reconcile,
            state: Arc::new(SyncMutex::new(HashMap::new())),
            config,
        }
    }

    pub fn cache(&self) -> &Arc<dyn Cache<T>> {
        &self.cache
    }

    pub async fn current_topology(&self) -> Option<Arc<Topology>> {
        self.topology.lock().await.clone()
    }

    /// Launch every runnable in parallel, wait for all to report
    /// `HasSynced`, then return. Callers keep the controller alive until
    /// their own cancellation signal fires; runnables observe the same
    /// `stop` receiver and exit when it does (§4.F lifecycle).
    pub async fn start(
        self: &Arc<Self>,
        runnables: Vec<Arc<dyn Runnable>>,
        stop: watch::Receiver<bool>,
    ) -> Result<(), StartError> {
        for r in &runnables {
            let r = r.clone();
            let stop = stop.clone();
            tokio::spawn(async move { r.run(stop).await });
        }

        let deadline = tokio::time::Instant::now() + self.config.sync_timeout;
        loop {
            if runnables.iter().all(|r| r.has_synced()) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                let unsynced = runnables.iter().filter(|r| !r.has_synced()).map(|r| r.name().to_string()).collect();
                return Err(StartError::SyncTimeout(unsynced));
            }
            tokio::time::sleep(self.config.sync_poll_interval).await;
        }
    }

    /// Wait for `stop` without tearing anything down (runnables observe
    /// the same receiver and exit on their own).
    pub async fn run_until_stopped(&self, stop: watch::Receiver<bool>) {
        wait_for_stop(stop).await;
    }

    /// An incremental-informer-driven mutation: exactly one event (§4.F).
    ///
    /// `dispatch_guard` serializes `cache.mutate -> topology.rebuild`
    /// across concurrent callers but is released before `reconcile` user
    /// code runs, so one caller's reconcile function never blocks another
    /// mutation from being picked up and rebuilt (§9).
    #[instrument(skip_all, fields(event.kind = ?event.kind, event.type = %kind))]
    pub async fn handle_event(&self, kind: GroupKind, id: uuid::Uuid, event: ResourceEvent<T>) {
        let ctx = {
            let _guard = self.dispatch_guard.lock().await;

            self.mutate_cache(&kind, id, &event);

            if Self::is_suppressed(&event) {
                return;
            }

            self.rebuild_topology(vec![event]).await
        };

        if let Some(ctx) = ctx {
            (self.reconcile)(ctx).await;
        }
    }

    /// A state-reconciler-driven mutation: the runnable hands the
    /// controller a full snapshot plus whatever events it chooses to
    /// report (possibly many, §4.F). Same guard-release discipline as
    /// [`Controller::handle_event`].
    #[instrument(skip_all, fields(events = events.len()))]
    pub async fn handle_batch(&self, snapshot: crate::cache::Snapshot<T>, events: Vec<ResourceEvent<T>>) {
        let ctx = {
            let _guard = self.dispatch_guard.lock().await;
            self.cache.replace(snapshot);
            self.rebuild_topology(events).await
        };

        if let Some(ctx) = ctx {
            (self.reconcile)(ctx).await;
        }
    }

    fn mutate_cache(&self, kind: &GroupKind, id: uuid::Uuid, event: &ResourceEvent<T>) {
        match event.kind {
            EventKind::Create | EventKind::Update => {
                if let Some(new) = &event.new {
                    self.cache.add(kind.clone(), id, new.clone());
                }
            }
            EventKind::Delete => {
                self.cache.delete(kind, &id);
            }
        }
    }

    /// Update suppression (§4.F step 2, §8): skip reconciliation entirely
    /// when both old and new are present and their generation is equal.
    fn is_suppressed(event: &ResourceEvent<T>) -> bool {
        match (&event.old, &event.new) {
            (Some(old), Some(new)) => old.generation() == new.generation(),
            _ => false,
        }
    }

    /// Rebuilds the topology snapshot and assembles the reconcile context.
    /// Called while `dispatch_guard` is held; returns `None` only when the
    /// rebuild failed and no previous topology exists to carry over (there
    /// is nothing yet to reconcile against).
    async fn rebuild_topology(&self, events: Vec<ResourceEvent<T>>) -> Option<ReconcileContext<T>> {
        let snapshot = self.cache.list();
        let mut topology_guard = self.topology.lock().await;

        let (topology, carryover) = match (self.topology_builder)(snapshot) {
            Ok((topo, warnings)) => {
                for w in &warnings {
                    if let TopologyWarning::DuplicateLocator { locator, kind } = w {
                        warn!(locator = %locator, kind = %kind, "duplicate locator during topology rebuild");
                    }
                }
                let topo = Arc::new(topo);
                *topology_guard = Some(topo.clone());
                (topo, None)
            }
            Err(e) => {
                // §4.F step 3 / §7: surface through the reconcile
                // function's error channel rather than crashing; keep
                // serving the previous topology.
                let existing = topology_guard.clone();
                match existing {
                    Some(topo) => (topo, Some(ReconcileError::TopologyRebuild(e.to_string()))),
                    None => return None,
                }
            }
        };
        drop(topology_guard);

        Some(ReconcileContext {
            events,
            topology,
            carryover,
            state: self.state.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    #[derive(Debug, Clone)]
    struct Obj {
        generation: u64,
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
            None
        }
        fn name(&self) -> &str {
            "obj"
        }
        fn creation_timestamp(&self) -> DateTime<Utc> {
            Utc::now()
        }
        fn generation(&self) -> u64 {
            self.generation
        }
    }

    fn noop_builder() -> TopologyBuilderFn<Obj> {
        Arc::new(|_snapshot| Topology::build(vec![], vec![], vec![], &[], Default::default()))
    }

    #[tokio::test]
    async fn update_suppression_skips_reconcile_matches_scenario_6() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let reconcile: ReconcileFn<Obj> = Arc::new(move |_ctx| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { None })
        });
        let controller = Controller::new(
            Arc::new(InMemoryCache::new()),
            noop_builder(),
            reconcile,
            ControllerConfig::default(),
        );
        let event = ResourceEvent::update(GroupKind::core("Obj"), Obj { generation: 3 }, Obj { generation: 3 });
        controller.handle_event(GroupKind::core("Obj"), Uuid::nil(), event).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn generation_change_triggers_reconcile() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let reconcile: ReconcileFn<Obj> = Arc::new(move |_ctx| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { None })
        });
        let controller = Controller::new(
            Arc::new(InMemoryCache::new()),
            noop_builder(),
            reconcile,
            ControllerConfig::default(),
        );
        let event = ResourceEvent::update(GroupKind::core("Obj"), Obj { generation: 3 }, Obj { generation: 4 });
        controller.handle_event(GroupKind::core("Obj"), Uuid::nil(), event).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
