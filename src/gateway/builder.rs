//! Fluent builder seeding a [`Topology`] with the concrete Gateway API
//! kinds and their link-function library (§4.D).

use super::kinds;
use super::refs::{self, gateway_attributes, service_attributes};
use crate::topology::{ConstructionError, LinkFunction, Topology, TopologyOptions, TopologyWarning};
use crate::types::{GroupKind, Locator, Object, Policy, Targetable};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Seeds a [`Topology`] with gateway classes, gateways, the five route
/// kinds, and services, installing the link-function library described in
/// §4.D. Expansion flags control whether container objects decompose into
/// their section targetables.
#[derive(Default)]
pub struct GatewayApiBuilder {
    gateway_classes: Vec<Targetable>,
    gateways: Vec<Targetable>,
    http_routes: Vec<Targetable>,
    grpc_routes: Vec<Targetable>,
    tcp_routes: Vec<Targetable>,
    tls_routes: Vec<Targetable>,
    udp_routes: Vec<Targetable>,
    services: Vec<Targetable>,
    policies: Vec<Policy>,
    free_objects: Vec<Arc<dyn Object>>,
    expand_listeners: bool,
    expand_route_rules: bool,
    expand_service_ports: bool,
    strict_backend_refs: bool,
}

impl GatewayApiBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gateway_classes(mut self, classes: Vec<Targetable>) -> Self {
        self.gateway_classes = classes;
        self
    }

    pub fn with_gateways(mut self, gateways: Vec<Targetable>) -> Self {
        self.gateways = gateways;
        self
    }

    pub fn with_http_routes(mut self, routes: Vec<Targetable>) -> Self {
        self.http_routes = routes;
        self
    }

    pub fn with_grpc_routes(mut self, routes: Vec<Targetable>) -> Self {
        self.grpc_routes = routes;
        self
    }

    pub fn with_tcp_routes(mut self, routes: Vec<Targetable>) -> Self {
        self.tcp_routes = routes;
        self
    }

    pub fn with_tls_routes(mut self, routes: Vec<Targetable>) -> Self {
        self.tls_routes = routes;
        self
    }

    pub fn with_udp_routes(mut self, routes: Vec<Targetable>) -> Self {
        self.udp_routes = routes;
        self
    }

    pub fn with_services(mut self, services: Vec<Targetable>) -> Self {
        self.services = services;
        self
    }

    pub fn with_policies(mut self, policies: Vec<Policy>) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_free_objects(mut self, objects: Vec<Arc<dyn Object>>) -> Self {
        self.free_objects = objects;
        self
    }

    /// Decompose gateways into their listener section targetables and
    /// install `Gateway -> Listener -> route` linking.
    pub fn expand_listeners(mut self, on: bool) -> Self {
        self.expand_listeners = on;
        self
    }

    /// Decompose routes into their route-rule section targetables.
    pub fn expand_route_rules(mut self, on: bool) -> Self {
        self.expand_route_rules = on;
        self
    }

    /// Decompose services into their service-port section targetables and
    /// install `Service -> ServicePort` linking.
    pub fn expand_service_ports(mut self, on: bool) -> Self {
        self.expand_service_ports = on;
        self
    }

    /// When `true`, a backendRef with an explicit port is dropped entirely
    /// for HTTP/GRPC routes (TCP/TLS/UDP routes always count theirs, per
    /// §9's "null port == any port" reading). Default `false`.
    pub fn strict_backend_refs(mut self, on: bool) -> Self {
        self.strict_backend_refs = on;
        self
    }

    /// Build the topology, installing every link function the expansion
    /// flags call for.
    pub fn build(self, options: TopologyOptions) -> Result<(Topology, Vec<TopologyWarning>), ConstructionError> {
        let gateway_kind = kinds::gateway();
        let gateway_class_kind = kinds::gateway_class();
        let service_kind = kinds::service();

        // Listener index, built before decomposition, used both to add
        // `Gateway -> Listener` edges and to fan a section-less parentRef
        // out to every listener of its gateway.
        let mut listener_index: BTreeMap<Locator, Vec<String>> = BTreeMap::new();
        for gw in &self.gateways {
            let attrs = gateway_attributes(gw);
            if !attrs.listeners.is_empty() {
                listener_index.insert(gw.locator(), attrs.listeners.iter().map(|l| l.name.clone()).collect());
            }
        }

        // Service-port index, built the same way.
        let mut service_port_names: BTreeMap<Locator, BTreeMap<u16, String>> = BTreeMap::new();
        for svc in &self.services {
            let attrs = service_attributes(svc);
            if !attrs.ports.is_empty() {
                service_port_names.insert(
                    svc.locator(),
                    attrs.ports.iter().map(|p| (p.port, p.name.clone())).collect(),
                );
            }
        }

        // Routes, tagged with their GroupKind and whether they ignore the
        // `strict` flag (§9), collected before service-port-index-based
        // backend resolution so the index sees every route.
        let all_routes: Vec<(Targetable, bool)> = self
            .http_routes
            .into_iter()
            .map(|r| (r, false))
            .chain(self.grpc_routes.into_iter().map(|r| (r, false)))
            .chain(self.tcp_routes.into_iter().map(|r| (r, true)))
            .chain(self.tls_routes.into_iter().map(|r| (r, true)))
            .chain(self.udp_routes.into_iter().map(|r| (r, true)))
            .collect();

        // Backend index, partitioned by route kind so each Route -> Service
        // link function below can declare its own `from_kind` accurately:
        // route kind -> target locator (bare service, or with service-port
        // expansion, `service#port`) -> contributing route locators.
        let mut backend_index: BTreeMap<GroupKind, BTreeMap<Locator, Vec<Locator>>> = BTreeMap::new();
        for (route, ignores_strict) in &all_routes {
            let route_locator = route.locator();
            let route_kind = route.group_kind().clone();
            let resolved =
                refs::resolve_backend_targets(route, &service_kind, self.strict_backend_refs, *ignores_strict);
            for backend in resolved {
                let target = match backend.port {
                    Some(port) if self.expand_service_ports => {
                        match service_port_names.get(&backend.service_locator).and_then(|ports| ports.get(&port)) {
                            Some(name) => backend.service_locator.with_section(name),
                            None => continue,
                        }
                    }
                    _ => backend.service_locator,
                };
                backend_index.entry(route_kind.clone()).or_default().entry(target).or_default().push(route_locator.clone());
            }
        }

        // Now assemble the full targetable list, decomposing containers
        // into their section targetables where the corresponding
        // expansion flag is set.
        let mut targetables: Vec<Targetable> = Vec::new();
        targetables.extend(self.gateway_classes);

        for gw in self.gateways {
            let gw = Arc::new(gw);
            if self.expand_listeners {
                if let Some(sections) = listener_index.get(&gw.locator()) {
                    for section in sections {
                        targetables.push(Targetable::new_section(gw.clone(), section.clone()));
                    }
                }
            }
            targetables.push((*gw).clone());
        }

        let mut route_kind_set: std::collections::BTreeSet<GroupKind> = std::collections::BTreeSet::new();
        for (route, _) in &all_routes {
            route_kind_set.insert(route.group_kind().clone());
        }
        let route_kinds: Vec<GroupKind> = route_kind_set.into_iter().collect();
        for (route, _) in all_routes {
            let route = Arc::new(route);
            if self.expand_route_rules {
                let attrs = refs::route_attributes(route.as_ref());
                for rule in &attrs.rules {
                    targetables.push(Targetable::new_section(route.clone(), rule.name.clone()));
                }
            }
            targetables.push((*route).clone());
        }

        for svc in self.services {
            let svc = Arc::new(svc);
            if self.expand_service_ports {
                if let Some(ports) = service_port_names.get(&svc.locator()) {
                    for name in ports.values() {
                        targetables.push(Targetable::new_section(svc.clone(), name.clone()));
                    }
                }
            }
            targetables.push((*svc).clone());
        }

        let mut link_functions: Vec<LinkFunction> = Vec::new();

        // GatewayClass -> Gateway, always installed.
        link_functions.push(LinkFunction::new(gateway_class_kind.clone(), gateway_kind.clone(), move |gw| {
            let attrs = gateway_attributes(gw);
            match attrs.gateway_class_name {
                Some(name) => vec![Locator::build(&gateway_class_kind, None, &name)],
                None => vec![],
            }
        }));

        // Gateway -> route, one link function per distinct route kind,
        // resolving each route's own parentRefs (fanning out to every
        // listener of the gateway when a reference carries no
        // sectionName and listener expansion is on).
        let expand_listeners = self.expand_listeners;
        let listener_index = Arc::new(listener_index);
        for route_kind in &route_kinds {
            let route_kind = route_kind.clone();
            let gateway_kind = gateway_kind.clone();
            let listener_index = listener_index.clone();
            link_functions.push(LinkFunction::new(gateway_kind.clone(), route_kind, move |route| {
                refs::resolve_gateway_parents(
                    route,
                    &gateway_kind,
                    if expand_listeners { Some(listener_index.as_ref()) } else { None },
                )
            }));
        }

        // Generic structural section edges (parent -> section) for every
        // kind that can carry a section: listeners under gateways,
        // route-rules under routes, service-ports under services. One
        // link function per distinct kind suffices because `to_kind`
        // filters which nodes invoke `resolve`, and a plain (non-section)
        // node simply resolves to nothing via `section_parent`.
        let mut section_kinds: Vec<GroupKind> = vec![gateway_kind.clone(), service_kind.clone()];
        section_kinds.extend(route_kinds.iter().cloned());
        for kind in section_kinds {
            link_functions.push(LinkFunction::new(kind.clone(), kind, |node| {
                node.section_parent().into_iter().collect()
            }));
        }

        // Route -> Service / ServicePort, one link function per distinct
        // route kind (mirroring the Gateway -> route loop above) so the
        // declared `from_kind` matches the actual parent of every edge it
        // produces, rather than being stamped as `Service -> Service`.
        for route_kind in &route_kinds {
            let index_for_kind = backend_index.get(route_kind).cloned().unwrap_or_default();
            link_functions.push(LinkFunction::new(route_kind.clone(), service_kind.clone(), move |service_or_port| {
                index_for_kind.get(&service_or_port.locator()).cloned().unwrap_or_default()
            }));
        }

        Topology::build(targetables, self.policies, self.free_objects, &link_functions, options)
    }
}
