//! Raw, kind-specific fields the builder stores on a [`Targetable`]'s
//! `attributes` JSON, and the link-function resolvers that read them back
//! (§4.D). Kept as plain serde structs rather than hardcoded onto
//! `Targetable` itself, per the object-model design notes (§9).

use crate::types::{GroupKind, Locator, Object};
use serde::{Deserialize, Serialize};

/// A `parentRef` on a route: identifies a gateway (optionally a specific
/// listener section) this route attaches to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentReference {
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    pub name: String,
    #[serde(default)]
    pub section_name: Option<String>,
}

impl ParentReference {
    /// Does this reference's `(group, kind)` identify a gateway (§4.D)?
    /// An omitted field defaults to the gateway kind's own, i.e. is
    /// treated as matching — this engine only ever resolves parentRefs
    /// against a single fixed Gateway `GroupKind`. Namespace defaulting
    /// happens separately in [`Self::gateway_locator`].
    fn identifies(&self, gateway_kind: &GroupKind) -> bool {
        let group = self.group.as_deref().unwrap_or(&gateway_kind.group);
        let kind = self.kind.as_deref().unwrap_or(&gateway_kind.kind);
        group.eq_ignore_ascii_case(&gateway_kind.group) && kind.eq_ignore_ascii_case(&gateway_kind.kind)
    }

    fn gateway_locator(&self, gateway_kind: &GroupKind, route_namespace: Option<&str>) -> Locator {
        let ns = self.namespace.as_deref().or(route_namespace);
        Locator::build(gateway_kind, ns, &self.name)
    }
}

/// A `backendRef` on a route: identifies a service, optionally a specific
/// port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendReference {
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    pub name: String,
    #[serde(default)]
    pub port: Option<u16>,
}

impl BackendReference {
    /// Empty/omitted group is treated as core (§4.D), which is exactly
    /// `service_kind.group` for the fixed Service kind this engine knows.
    fn identifies(&self, service_kind: &GroupKind) -> bool {
        let group = self.group.as_deref().unwrap_or(&service_kind.group);
        let kind = self.kind.as_deref().unwrap_or(&service_kind.kind);
        group.eq_ignore_ascii_case(&service_kind.group) && kind.eq_ignore_ascii_case(&service_kind.kind)
    }

    fn service_locator(&self, service_kind: &GroupKind, route_namespace: Option<&str>) -> Locator {
        let ns = self.namespace.as_deref().or(route_namespace);
        Locator::build(service_kind, ns, &self.name)
    }
}

/// A listener declared on a gateway's `spec.listeners`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerSpec {
    pub name: String,
}

/// A rule declared on a route's `spec.rules`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRuleSpec {
    pub name: String,
}

/// A port declared on a service's `spec.ports`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePortSpec {
    pub name: String,
    pub port: u16,
}

/// Raw attributes stored on a gateway targetable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayAttributes {
    #[serde(default)]
    pub gateway_class_name: Option<String>,
    #[serde(default)]
    pub listeners: Vec<ListenerSpec>,
}

/// Raw attributes stored on a route targetable (any of the five kinds).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteAttributes {
    #[serde(default)]
    pub parent_refs: Vec<ParentReference>,
    #[serde(default)]
    pub rules: Vec<RouteRuleSpec>,
    #[serde(default)]
    pub backend_refs: Vec<BackendReference>,
}

/// Raw attributes stored on a service targetable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceAttributes {
    #[serde(default)]
    pub ports: Vec<ServicePortSpec>,
}

fn attrs_of<T: for<'de> Deserialize<'de> + Default>(object: &dyn Object) -> T {
    serde_json::from_value(object.attributes()).unwrap_or_default()
}

pub fn gateway_attributes(object: &dyn Object) -> GatewayAttributes {
    attrs_of(object)
}

pub fn route_attributes(object: &dyn Object) -> RouteAttributes {
    attrs_of(object)
}

pub fn service_attributes(object: &dyn Object) -> ServiceAttributes {
    attrs_of(object)
}

/// Resolve the candidate gateway parent locators for a route's
/// `parentRefs`, honoring listener expansion: with a `sectionName`, the
/// reference resolves to that exact listener; without one, it fans out to
/// every listener of the parent gateway found in `listener_index`.
pub fn resolve_gateway_parents(
    route: &dyn Object,
    gateway_kind: &GroupKind,
    listener_index: Option<&std::collections::BTreeMap<Locator, Vec<String>>>,
) -> Vec<Locator> {
    let attrs = route_attributes(route);
    let route_ns = route.namespace();
    let mut out = Vec::new();
    for parent_ref in &attrs.parent_refs {
        if !parent_ref.identifies(gateway_kind) {
            continue;
        }
        let gw_locator = parent_ref.gateway_locator(gateway_kind, route_ns);
        match (&parent_ref.section_name, listener_index) {
            (Some(section), Some(_)) => {
                out.push(gw_locator.with_section(section));
            }
            (None, Some(index)) => {
                if let Some(sections) = index.get(&gw_locator) {
                    for section in sections {
                        out.push(gw_locator.with_section(section));
                    }
                }
            }
            (_, None) => out.push(gw_locator),
        }
    }
    out
}

/// One backendRef's resolved target, after the `strict` filter (§4.D,
/// §9 Open Questions: TCP/TLS/UDP ignore `strict` entirely).
pub struct ResolvedBackend {
    pub service_locator: Locator,
    /// `Some(port)` when the backendRef specifies a port (candidate for
    /// the exact-service-port link); `None` when it targets the bare
    /// service.
    pub port: Option<u16>,
}

/// Resolve a route's `backendRefs` against the `strict` flag, dropping
/// refs that don't count per §4.D / §9.
pub fn resolve_backend_targets(
    route: &dyn Object,
    service_kind: &GroupKind,
    strict: bool,
    route_kind_ignores_strict: bool,
) -> Vec<ResolvedBackend> {
    let attrs = route_attributes(route);
    let route_ns = route.namespace();
    let mut out = Vec::new();
    for backend_ref in &attrs.backend_refs {
        if !backend_ref.identifies(service_kind) {
            continue;
        }
        if strict && !route_kind_ignores_strict && backend_ref.port.is_some() {
            continue;
        }
        out.push(ResolvedBackend {
            service_locator: backend_ref.service_locator(service_kind, route_ns),
            port: backend_ref.port,
        });
    }
    out
}
