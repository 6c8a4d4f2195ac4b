//! The universal node identity: `GroupKind`, `Locator`, and the `Object` trait.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain qualifier + kind name for an object's schema.
///
/// Lowercasing happens at locator-render time, not at construction, so that
/// `GroupKind::new("Gateway.networking.k8s.io", "Gateway")` still prints as
/// the caller wrote it via `Debug`/`Display` for diagnostics, while
/// `Locator::build` always normalizes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKind {
    /// Domain qualifier, e.g. `gateway.networking.k8s.io`. Empty string for
    /// "core" kinds (plain `Service`, `Secret`, ...).
    pub group: String,
    /// Kind name, e.g. `Gateway`, `HTTPRoute`.
    pub kind: String,
}

impl GroupKind {
    /// Construct a new group/kind pair.
    pub fn new(group: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            kind: kind.into(),
        }
    }

    /// Construct a "core" (groupless) group/kind pair.
    pub fn core(kind: impl Into<String>) -> Self {
        Self::new("", kind)
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.kind.to_lowercase())
        } else {
            write!(f, "{}.{}", self.group.to_lowercase(), self.kind.to_lowercase())
        }
    }
}

/// Canonical string identity of a node in a [`crate::topology::Topology`].
///
/// Grammar: `lower(group) "." lower(kind) ":" [namespace "/"] name ["#" section]`,
/// with the `group.` segment entirely omitted for core (groupless) kinds.
/// The `#` separator is reserved and must not otherwise appear in a name or
/// section.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Locator(String);

impl Locator {
    /// Build a locator from its constituent parts. `name` may itself already
    /// carry a `#section` suffix (this is how section-scoped targetables are
    /// represented, see [`crate::types::Targetable`]).
    pub fn build(group_kind: &GroupKind, namespace: Option<&str>, name: &str) -> Self {
        let mut s = group_kind.to_string();
        s.push(':');
        if let Some(ns) = namespace.filter(|ns| !ns.is_empty()) {
            s.push_str(ns);
            s.push('/');
        }
        s.push_str(name);
        Self(s)
    }

    /// The locator as a plain string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append a `#section` suffix to an existing locator, used by link
    /// resolvers that only know a parent's locator and a section name
    /// (e.g. fanning a route out to every listener of a gateway).
    pub fn with_section(&self, section: &str) -> Self {
        Self(format!("{}#{}", self.0, section))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Locator> for String {
    fn from(l: Locator) -> Self {
        l.0
    }
}

/// Capability interface shared by every node kind admitted into a topology:
/// targetables, policies, and free objects alike.
///
/// Per the design notes, this is deliberately a small capability trait
/// rather than a deep inheritance hierarchy; section-scoped nodes are
/// composition (a struct holding the parent plus a section token), not a
/// distinct implementor with overridden virtual dispatch.
pub trait Object: fmt::Debug + Send + Sync {
    /// The object's group/kind pair.
    fn group_kind(&self) -> &GroupKind;
    /// The object's namespace, if any.
    fn namespace(&self) -> Option<&str>;
    /// The object's name (section-scoped nodes render `parentName#section`
    /// here already; see [`crate::types::Targetable::new_section`]).
    fn name(&self) -> &str;

    /// The object's locator, computed per the canonical grammar.
    fn locator(&self) -> Locator {
        Locator::build(self.group_kind(), self.namespace(), self.name())
    }

    /// Kind-specific raw fields consulted by link-function resolvers.
    /// `Null` for object kinds that carry none (policies, free objects);
    /// overridden by `Targetable`.
    fn attributes(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// The locator of the parent targetable, for section-scoped nodes
    /// (listener, route-rule, service-port) only. `None` for every other
    /// object kind. This is how the Gateway-API builder's structural
    /// decomposition edges (Gateway -> Listener, Service -> ServicePort)
    /// are resolved without hardcoding section kinds into the topology
    /// itself (§4.D, §9).
    fn section_parent(&self) -> Option<Locator> {
        None
    }
}

/// A minimal, concrete [`Object`] implementation used for free-standing
/// objects and for policy target references (which are themselves
/// `Object`s whose locator must equal the locator of the node they denote).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Group/kind of the referenced object.
    pub group_kind: GroupKind,
    /// Namespace, if any.
    pub namespace: Option<String>,
    /// Name, optionally already carrying a `#section` suffix.
    pub name: String,
}

impl ObjectRef {
    /// Construct a plain object reference.
    pub fn new(group_kind: GroupKind, namespace: Option<String>, name: impl Into<String>) -> Self {
        Self {
            group_kind,
            namespace,
            name: name.into(),
        }
    }

    /// Construct a reference to a section of a parent object, e.g. a
    /// listener inside a gateway.
    pub fn new_section(
        group_kind: GroupKind,
        namespace: Option<String>,
        parent_name: impl Into<String>,
        section: impl Into<String>,
    ) -> Self {
        Self {
            group_kind,
            namespace,
            name: format!("{}#{}", parent_name.into(), section.into()),
        }
    }
}

impl Object for ObjectRef {
    fn group_kind(&self) -> &GroupKind {
        &self.group_kind
    }

    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.locator())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_core_kind_omits_group() {
        let gk = GroupKind::core("Service");
        let loc = Locator::build(&gk, Some("default"), "my-svc");
        assert_eq!(loc.as_str(), "service:default/my-svc");
    }

    #[test]
    fn locator_lowercases_group_and_kind() {
        let gk = GroupKind::new("Gateway.networking.k8s.io", "Gateway");
        let loc = Locator::build(&gk, Some("ns"), "gw");
        assert_eq!(loc.as_str(), "gateway.networking.k8s.io.gateway:ns/gw");
    }

    #[test]
    fn locator_omits_namespace_when_absent() {
        let gk = GroupKind::core("GatewayClass");
        let loc = Locator::build(&gk, None, "my-class");
        assert_eq!(loc.as_str(), "gatewayclass:my-class");
    }

    #[test]
    fn locator_section_suffix_rides_on_name() {
        let gk = GroupKind::new("gateway.networking.k8s.io", "Gateway");
        let reference = ObjectRef::new_section(gk, Some("ns".into()), "gw", "http");
        assert_eq!(reference.locator().as_str(), "gateway.networking.k8s.io.gateway:ns/gw#http");
    }
}
