//! Channel-driven adapters implementing [`Runnable`] for the two shapes
//! named in §4.F. The concrete watch transport is explicitly out of scope
//! (§1), so both shapes are driven by an `mpsc` channel that tests and
//! embedders feed directly; a real embedder would plug a watch client's
//! output into the sender half instead.

use super::controller::Controller;
use super::runnable::{wait_for_stop, Runnable, RunnableCore};
use crate::cache::Snapshot;
use crate::types::{GroupKind, ResourceEvent, ResourceMeta};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::instrument;

/// One inbound mutation for an [`IncrementalInformer`]: the kind/id pair
/// identifies the object within the cache, the event carries old/new.
pub struct IncrementalMessage<T> {
    pub kind: GroupKind,
    pub id: uuid::Uuid,
    pub event: ResourceEvent<T>,
}

/// Fine-grained informer: each message is dispatched through
/// [`Controller::handle_event`] individually (§4.F: "translates add/update/
/// delete notifications one at a time").
pub struct IncrementalInformer<T: ResourceMeta + Clone + Send + Sync + 'static> {
    core: RunnableCore,
    controller: Arc<Controller<T>>,
    inbox: tokio::sync::Mutex<mpsc::Receiver<IncrementalMessage<T>>>,
}

impl<T: ResourceMeta + Clone + Send + Sync + 'static> IncrementalInformer<T> {
    pub fn new(
        name: impl Into<String>,
        controller: Arc<Controller<T>>,
    ) -> (Self, mpsc::Sender<IncrementalMessage<T>>) {
        let (tx, rx) = mpsc::channel(1024);
        (
            Self {
                core: RunnableCore::new(name),
                controller,
                inbox: tokio::sync::Mutex::new(rx),
            },
            tx,
        )
    }
}

#[async_trait]
impl<T: ResourceMeta + Clone + Send + Sync + 'static> Runnable for IncrementalInformer<T> {
    fn name(&self) -> &str {
        &self.core.name
    }

    #[instrument(skip_all, fields(runnable = %self.core.name))]
    async fn run(&self, mut stop: watch::Receiver<bool>) {
        let mut inbox = self.inbox.lock().await;
        self.core.synced.mark_synced();
        loop {
            tokio::select! {
                biased;
                _ = stop.changed() => {
                    if *stop.borrow() {
                        return;
                    }
                }
                msg = inbox.recv() => {
                    match msg {
                        Some(IncrementalMessage { kind, id, event }) => {
                            self.controller.handle_event(kind, id, event).await;
                        }
                        None => return,
                    }
                }
            }
        }
    }

    fn has_synced(&self) -> bool {
        self.core.synced.is_synced()
    }
}

/// One inbound mutation for a [`StateReconciler`]: a full re-list plus
/// whatever events the caller chooses to report alongside it.
pub struct StateBatch<T> {
    pub snapshot: Snapshot<T>,
    pub events: Vec<ResourceEvent<T>>,
}

/// Coarse-grained reconciler: each message replaces the whole cache
/// snapshot and dispatches through [`Controller::handle_batch`] (§4.F:
/// "re-lists the world and diffs itself").
pub struct StateReconciler<T: ResourceMeta + Clone + Send + Sync + 'static> {
    core: RunnableCore,
    controller: Arc<Controller<T>>,
    inbox: tokio::sync::Mutex<mpsc::Receiver<StateBatch<T>>>,
}

impl<T: ResourceMeta + Clone + Send + Sync + 'static> StateReconciler<T> {
    pub fn new(name: impl Into<String>, controller: Arc<Controller<T>>) -> (Self, mpsc::Sender<StateBatch<T>>) {
        let (tx, rx) = mpsc::channel(64);
        (
            Self {
                core: RunnableCore::new(name),
                controller,
                inbox: tokio::sync::Mutex::new(rx),
            },
            tx,
        )
    }
}

#[async_trait]
impl<T: ResourceMeta + Clone + Send + Sync + 'static> Runnable for StateReconciler<T> {
    fn name(&self) -> &str {
        &self.core.name
    }

    #[instrument(skip_all, fields(runnable = %self.core.name))]
    async fn run(&self, mut stop: watch::Receiver<bool>) {
        let mut inbox = self.inbox.lock().await;
        loop {
            tokio::select! {
                biased;
                _ = stop.changed() => {
                    if *stop.borrow() {
                        return;
                    }
                }
                msg = inbox.recv() => {
                    match msg {
                        Some(StateBatch { snapshot, events }) => {
                            self.controller.handle_batch(snapshot, events).await;
                            self.core.synced.mark_synced();
                        }
                        None => return,
                    }
                }
            }
        }
    }

    fn has_synced(&self) -> bool {
        self.core.synced.is_synced()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::runtime::controller::{ControllerConfig, ReconcileContext};
    use crate::runtime::error::ReconcileError;
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

    fn noop_builder() -> super::super::controller::TopologyBuilderFn<Obj> {
        Arc::new(|_snapshot| {
            crate::topology::Topology::build(vec![], vec![], vec![], &[], Default::default())
        })
    }

    #[tokio::test]
    async fn incremental_informer_dispatches_events_to_the_controller() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let reconcile: super::super::controller::ReconcileFn<Obj> = Arc::new(move |_ctx: ReconcileContext<Obj>| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { None::<ReconcileError> })
        });
        let controller = Arc::new(Controller::new(
            Arc::new(InMemoryCache::new()),
            noop_builder(),
            reconcile,
            ControllerConfig::default(),
        ));
        let (informer, tx) = IncrementalInformer::new("test-informer", controller.clone());
        let (_stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move { informer.run(stop_rx).await });

        tx.send(IncrementalMessage {
            kind: GroupKind::core("Obj"),
            id: Uuid::new_v4(),
            event: ResourceEvent::create(GroupKind::core("Obj"), Obj { generation: 1 }),
        })
        .await
        .unwrap();

        drop(tx);
        handle.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.cache().list().len(), 1);
    }
}
