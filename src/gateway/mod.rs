//! The concrete Gateway API link-function library and builder (§4.D).
//!
//! Everything concrete-Gateway-API-shaped lives here, kept out of
//! `topology` so the graph engine stays schema-agnostic (§1 scope).

pub mod builder;
pub mod kinds;
pub mod refs;

pub use builder::GatewayApiBuilder;
pub use refs::{
    BackendReference, GatewayAttributes, ListenerSpec, ParentReference, ResolvedBackend, RouteAttributes,
    RouteRuleSpec, ServiceAttributes, ServicePortSpec,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::TopologyOptions;
    use crate::types::{GroupKind, Targetable};
    use serde_json::json;

    fn gateway(name: &str, class: &str, listeners: &[&str]) -> Targetable {
        Targetable::new(kinds::gateway(), Some("ns".into()), name).with_attributes(json!({
            "gateway_class_name": class,
            "listeners": listeners.iter().map(|l| json!({"name": l})).collect::<Vec<_>>(),
        }))
    }

    fn gateway_class(name: &str) -> Targetable {
        Targetable::new(kinds::gateway_class(), None, name)
    }

    fn http_route(name: &str, parent: &str, section: Option<&str>) -> Targetable {
        Targetable::new(kinds::http_route(), Some("ns".into()), name).with_attributes(json!({
            "parent_refs": [{"name": parent, "section_name": section}],
        }))
    }

    #[test]
    fn single_hop_matches_scenario_1() {
        let builder = GatewayApiBuilder::new()
            .with_gateway_classes(vec![gateway_class("gc")])
            .with_gateways(vec![gateway("g", "gc", &[])])
            .with_http_routes(vec![http_route("r", "g", None)]);
        let (topo, warnings) = builder.build(TopologyOptions::default()).unwrap();
        assert!(warnings.is_empty());
        let g = crate::types::Locator::build(&kinds::gateway(), Some("ns"), "g");
        let r = crate::types::Locator::build(&kinds::http_route(), Some("ns"), "r");
        assert_eq!(topo.paths(&g, &r), vec![vec![g.clone(), r.clone()]]);
        assert_eq!(topo.paths(&r, &g), Vec::<Vec<crate::types::Locator>>::new());
    }

    #[test]
    fn section_fan_out_matches_scenario_2() {
        let builder = GatewayApiBuilder::new()
            .with_gateways(vec![gateway("g", "gc", &["l1", "l2"])])
            .with_http_routes(vec![http_route("r", "g", Some("l2"))])
            .expand_listeners(true);
        let (topo, _) = builder.build(TopologyOptions::default()).unwrap();
        let g = crate::types::Locator::build(&kinds::gateway(), Some("ns"), "g");
        let g_l2 = g.with_section("l2");
        let g_l1 = g.with_section("l1");
        let r = crate::types::Locator::build(&kinds::http_route(), Some("ns"), "r");
        assert_eq!(topo.paths(&g, &r), vec![vec![g.clone(), g_l2.clone(), r.clone()]]);
        assert_eq!(topo.paths(&g_l1, &r), Vec::<Vec<crate::types::Locator>>::new());
    }

    #[test]
    fn section_less_parent_ref_fans_out_to_every_listener() {
        let builder = GatewayApiBuilder::new()
            .with_gateways(vec![gateway("g", "gc", &["l1", "l2"])])
            .with_http_routes(vec![http_route("r", "g", None)])
            .expand_listeners(true);
        let (topo, _) = builder.build(TopologyOptions::default()).unwrap();
        let g = crate::types::Locator::build(&kinds::gateway(), Some("ns"), "g");
        let r = crate::types::Locator::build(&kinds::http_route(), Some("ns"), "r");
        let mut paths = topo.paths(&g, &r);
        paths.sort();
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn service_port_expansion_matches_exact_port() {
        let service = Targetable::new(GroupKind::core("Service"), Some("ns".into()), "svc").with_attributes(json!({
            "ports": [{"name": "http", "port": 80}, {"name": "grpc", "port": 90}],
        }));
        let route = Targetable::new(kinds::http_route(), Some("ns".into()), "r").with_attributes(json!({
            "parent_refs": [{"name": "g"}],
            "backend_refs": [{"name": "svc", "port": 80}],
        }));
        let builder = GatewayApiBuilder::new()
            .with_gateways(vec![gateway("g", "gc", &[])])
            .with_http_routes(vec![route])
            .with_services(vec![service])
            .expand_service_ports(true);
        let (topo, _) = builder.build(TopologyOptions::default()).unwrap();
        let r = crate::types::Locator::build(&kinds::http_route(), Some("ns"), "r");
        let svc_http = crate::types::Locator::build(&GroupKind::core("Service"), Some("ns"), "svc").with_section("http");
        let svc_grpc = crate::types::Locator::build(&GroupKind::core("Service"), Some("ns"), "svc").with_section("grpc");
        assert_eq!(topo.paths(&r, &svc_http), vec![vec![r.clone(), svc_http.clone()]]);
        assert_eq!(topo.paths(&r, &svc_grpc), Vec::<Vec<crate::types::Locator>>::new());
    }

    #[test]
    fn strict_backend_refs_drops_ports_for_http_routes_but_not_tcp_routes() {
        let route_with_port = |kind: GroupKind, name: &str| {
            Targetable::new(kind, Some("ns".into()), name).with_attributes(json!({
                "parent_refs": [{"name": "g"}],
                "backend_refs": [{"name": "svc", "port": 80}],
            }))
        };
        let builder = GatewayApiBuilder::new()
            .with_gateways(vec![gateway("g", "gc", &[])])
            .with_http_routes(vec![route_with_port(kinds::http_route(), "hr")])
            .with_tcp_routes(vec![route_with_port(kinds::tcp_route(), "tr")])
            .with_services(vec![Targetable::new(GroupKind::core("Service"), Some("ns".into()), "svc")])
            .strict_backend_refs(true);
        let (topo, _) = builder.build(TopologyOptions::default()).unwrap();
        let svc = crate::types::Locator::build(&GroupKind::core("Service"), Some("ns"), "svc");
        let hr = crate::types::Locator::build(&kinds::http_route(), Some("ns"), "hr");
        let tr = crate::types::Locator::build(&kinds::tcp_route(), Some("ns"), "tr");
        assert_eq!(topo.paths(&hr, &svc), Vec::<Vec<crate::types::Locator>>::new());
        assert_eq!(topo.paths(&tr, &svc), vec![vec![tr.clone(), svc.clone()]]);
    }
}
