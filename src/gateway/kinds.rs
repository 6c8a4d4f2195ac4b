//! The fixed `GroupKind` table for the concrete Gateway API kinds the
//! builder understands (§4.D).

use crate::types::GroupKind;

const GROUP: &str = "gateway.networking.k8s.io";

pub fn gateway_class() -> GroupKind {
    GroupKind::new(GROUP, "GatewayClass")
}

pub fn gateway() -> GroupKind {
    GroupKind::new(GROUP, "Gateway")
}

pub fn http_route() -> GroupKind {
    GroupKind::new(GROUP, "HTTPRoute")
}

pub fn grpc_route() -> GroupKind {
    GroupKind::new(GROUP, "GRPCRoute")
}

pub fn tcp_route() -> GroupKind {
    GroupKind::new(GROUP, "TCPRoute")
}

pub fn tls_route() -> GroupKind {
    GroupKind::new(GROUP, "TLSRoute")
}

pub fn udp_route() -> GroupKind {
    GroupKind::new(GROUP, "UDPRoute")
}

/// `Service` is a core kind: empty group.
pub fn service() -> GroupKind {
    GroupKind::core("Service")
}

/// The five route kinds, in the order the builder installs their link
/// functions.
pub fn route_kinds() -> [GroupKind; 5] {
    [http_route(), grpc_route(), tcp_route(), tls_route(), udp_route()]
}

/// Route kinds whose `strict` backend-ref semantics follow the
/// "null port == any port" reading (§9 Open Questions): TCP/TLS/UDP routes
/// carry no `port` disambiguation the way HTTP/GRPC backendRefs do, so
/// `strict` has no effect on them and every backendRef always counts.
pub fn route_kind_ignores_strict(kind: &GroupKind) -> bool {
    *kind == tcp_route() || *kind == tls_route() || *kind == udp_route()
}
