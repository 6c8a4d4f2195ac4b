//! Resource events and the matchers that filter them.

use crate::types::object::GroupKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of mutation a resource event carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Create,
    Update,
    Delete,
}

/// Metadata every inbound object must expose to the cache and controller.
/// `id` is a process-unique identity; `generation` is consulted only to
/// suppress spurious updates (§6, §4.F).
pub trait ResourceMeta: std::fmt::Debug + Send + Sync {
    fn id(&self) -> Uuid;
    fn group_kind(&self) -> &GroupKind;
    fn namespace(&self) -> Option<&str>;
    fn name(&self) -> &str;
    fn creation_timestamp(&self) -> DateTime<Utc>;
    fn generation(&self) -> u64;
}

/// A triple `(groupKind, eventKind, oldObject?, newObject?)`.
///
/// Invariant: `Create` carries only `new`; `Delete` carries only `old`;
/// `Update` carries both and their locators are equal. This is enforced by
/// the constructors rather than the field types, so the event remains a
/// plain, serializable value.
#[derive(Debug, Clone)]
pub struct ResourceEvent<T> {
    pub group_kind: GroupKind,
    pub kind: EventKind,
    pub old: Option<T>,
    pub new: Option<T>,
}

impl<T> ResourceEvent<T> {
    pub fn create(group_kind: GroupKind, new: T) -> Self {
        Self {
            group_kind,
            kind: EventKind::Create,
            old: None,
            new: Some(new),
        }
    }

    pub fn delete(group_kind: GroupKind, old: T) -> Self {
        Self {
            group_kind,
            kind: EventKind::Delete,
            old: Some(old),
            new: None,
        }
    }

    pub fn update(group_kind: GroupKind, old: T, new: T) -> Self {
        Self {
            group_kind,
            kind: EventKind::Update,
            old: Some(old),
            new: Some(new),
        }
    }
}

/// An optional filter over `(groupKind, eventKind, namespace, name)`.
/// Absent fields match any value; within one matcher all populated fields
/// AND together, while a list of matchers ORs across entries (see
/// [`crate::workflow::Subscription`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMatcher {
    pub group_kind: Option<GroupKind>,
    pub event_kind: Option<EventKind>,
    pub namespace: Option<String>,
    pub name: Option<String>,
}

impl EventMatcher {
    pub fn matches<T>(&self, event: &ResourceEvent<T>, namespace: Option<&str>, name: Option<&str>) -> bool {
        if let Some(gk) = &self.group_kind {
            if gk != &event.group_kind {
                return false;
            }
        }
        if let Some(ek) = &self.event_kind {
            if *ek != event.kind {
                return false;
            }
        }
        if let Some(ns) = &self.namespace {
            if Some(ns.as_str()) != namespace {
                return false;
            }
        }
        if let Some(n) = &self.name {
            if Some(n.as_str()) != name {
                return false;
            }
        }
        true
    }
}
