//! Targetable nodes: objects policies may attach to, including
//! section-scoped (composition-over-inheritance) variants.

use crate::types::object::{GroupKind, Locator, Object};
use std::sync::Arc;

/// An object that policies may attach to.
///
/// Section-scoped targetables (listener, route-rule, service-port) are not
/// a distinct type: a `Targetable` that carries a `parent` is the section
/// variant, its `name` already rendered as `parentName#section` so that the
/// default [`Object::locator`] impl produces the correct `#section`
/// suffix with no special-casing.
#[derive(Debug, Clone)]
pub struct Targetable {
    group_kind: GroupKind,
    namespace: Option<String>,
    name: String,
    /// Set for section-scoped targetables; `None` for top-level ones.
    parent: Option<Arc<Targetable>>,
    section: Option<String>,
    /// Raw, kind-specific fields (`gatewayClassName`, `parentRefs`,
    /// `backendRefs`, `listeners`, ...) consulted by link-function
    /// resolvers. Keeping this generic (rather than hardcoding Gateway API
    /// fields onto `Targetable`) is what lets the object model stay a
    /// small capability interface per the design notes.
    attributes: serde_json::Value,
}

impl Targetable {
    /// Construct a top-level targetable.
    pub fn new(group_kind: GroupKind, namespace: Option<String>, name: impl Into<String>) -> Self {
        Self {
            group_kind,
            namespace,
            name: name.into(),
            parent: None,
            section: None,
            attributes: serde_json::Value::Null,
        }
    }

    /// Construct a section-scoped targetable beneath `parent` (e.g. a
    /// listener within a gateway, a route-rule within a route, a
    /// service-port within a service). Shares the parent's group/kind and
    /// namespace; the rendered name is `parentName#section`.
    pub fn new_section(parent: Arc<Targetable>, section: impl Into<String>) -> Self {
        let section = section.into();
        let name = format!("{}#{}", parent.name(), section);
        Self {
            group_kind: parent.group_kind.clone(),
            namespace: parent.namespace.clone(),
            name,
            parent: Some(parent),
            section: Some(section),
            attributes: serde_json::Value::Null,
        }
    }

    /// Attach kind-specific raw fields, consulted by link-function
    /// resolvers (see `crate::gateway::links`).
    pub fn with_attributes(mut self, attributes: serde_json::Value) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn attributes(&self) -> &serde_json::Value {
        &self.attributes
    }

    /// The parent targetable, if this is a section-scoped node.
    pub fn parent(&self) -> Option<&Arc<Targetable>> {
        self.parent.as_ref()
    }

    /// The section token, if this is a section-scoped node.
    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    pub fn is_section(&self) -> bool {
        self.parent.is_some()
    }
}

impl Object for Targetable {
    fn group_kind(&self) -> &GroupKind {
        &self.group_kind
    }

    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> serde_json::Value {
        self.attributes.clone()
    }

    fn section_parent(&self) -> Option<Locator> {
        self.parent.as_ref().map(|p| p.locator())
    }
}

impl std::fmt::Display for Targetable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.locator())
    }
}

/// Convenience to compute a targetable's locator without constructing an
/// instance, used by link functions resolving backend/parent references.
pub fn targetable_locator(group_kind: &GroupKind, namespace: Option<&str>, name: &str) -> Locator {
    Locator::build(group_kind, namespace, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_targetable_shares_parent_identity_with_suffix() {
        let gw = Arc::new(Targetable::new(
            GroupKind::new("gateway.networking.k8s.io", "Gateway"),
            Some("ns".into()),
            "gw",
        ));
        let listener = Targetable::new_section(gw.clone(), "http");
        assert_eq!(listener.locator().as_str(), "gateway.networking.k8s.io.gateway:ns/gw#http");
        assert_eq!(listener.parent().unwrap().locator(), gw.locator());
    }
}
