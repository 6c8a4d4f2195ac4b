//! Thread-safe observed-resource store with change notification (§4.E).

pub mod memory;

pub use memory::InMemoryCache;

use crate::types::GroupKind;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to convert raw object {id} ({kind}) to a typed object: {reason}")]
    Conversion { id: Uuid, kind: GroupKind, reason: String },
}

/// An insertion-order-indifferent snapshot of observed resources, keyed by
/// process-unique id and bucketed by group/kind for scoped iteration.
#[derive(Debug, Clone, Default)]
pub struct Snapshot<T> {
    by_kind: BTreeMap<GroupKind, BTreeMap<Uuid, T>>,
}

impl<T: Clone> Snapshot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: GroupKind, id: Uuid, object: T) {
        self.by_kind.entry(kind).or_default().insert(id, object);
    }

    pub fn remove(&mut self, kind: &GroupKind, id: &Uuid) {
        if let Some(bucket) = self.by_kind.get_mut(kind) {
            bucket.remove(id);
        }
    }

    pub fn get(&self, kind: &GroupKind, id: &Uuid) -> Option<&T> {
        self.by_kind.get(kind).and_then(|b| b.get(id))
    }

    pub fn of_kind(&self, kind: &GroupKind) -> impl Iterator<Item = (&Uuid, &T)> {
        self.by_kind.get(kind).into_iter().flat_map(|b| b.iter())
    }

    pub fn all(&self) -> impl Iterator<Item = (&GroupKind, &Uuid, &T)> {
        self.by_kind
            .iter()
            .flat_map(|(kind, bucket)| bucket.iter().map(move |(id, obj)| (kind, id, obj)))
    }

    pub fn len(&self) -> usize {
        self.by_kind.values().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `List`/`Add`/`Delete`/`Replace`, safe under concurrent readers and
/// writers; writers emit a change signal observed by the controller.
pub trait Cache<T: Clone + Send + Sync>: Send + Sync {
    fn list(&self) -> Snapshot<T>;
    fn add(&self, kind: GroupKind, id: Uuid, object: T);
    fn delete(&self, kind: &GroupKind, id: &Uuid);
    fn replace(&self, snapshot: Snapshot<T>);
    /// A receiver of a monotonically increasing revision counter, bumped
    /// on every mutation.
    fn subscribe(&self) -> tokio::sync::watch::Receiver<u64>;
}
