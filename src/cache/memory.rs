//! `parking_lot::RwLock`-backed in-memory [`Cache`]. New: the lock plus
//! `tokio::sync::watch` change-revision broadcaster has no teacher
//! analogue (the teacher's `InMemoryGraphStore` is a plain, unsynchronized
//! `BTreeMap`/`BTreeSet` store); this shape follows §9's concurrency notes
//! directly, using `parking_lot`/`tokio::sync` the way the rest of this
//! crate already does for shared mutable state.

use super::{Cache, Snapshot};
use crate::types::GroupKind;
use parking_lot::RwLock;
use tokio::sync::watch;
use uuid::Uuid;

pub struct InMemoryCache<T: Clone + Send + Sync> {
    state: RwLock<Snapshot<T>>,
    revision_tx: watch::Sender<u64>,
}

impl<T: Clone + Send + Sync> InMemoryCache<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            state: RwLock::new(Snapshot::new()),
            revision_tx: tx,
        }
    }

    fn bump(&self) {
        self.revision_tx.send_modify(|r| *r += 1);
    }
}

impl<T: Clone + Send + Sync> Default for InMemoryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> Cache<T> for InMemoryCache<T> {
    fn list(&self) -> Snapshot<T> {
        self.state.read().clone()
    }

    fn add(&self, kind: GroupKind, id: Uuid, object: T) {
        self.state.write().insert(kind, id, object);
        self.bump();
    }

    fn delete(&self, kind: &GroupKind, id: &Uuid) {
        self.state.write().remove(kind, id);
        self.bump();
    }

    fn replace(&self, snapshot: Snapshot<T>) {
        *self.state.write() = snapshot;
        self.bump();
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }
}
