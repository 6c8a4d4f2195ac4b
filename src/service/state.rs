//! Service state: the current topology snapshot plus the config it was
//! last built with.

use crate::gateway::GatewayApiBuilder;
use crate::topology::{ConstructionError, Topology, TopologyWarning};
use crate::types::{GroupKind, Policy, Rule, TargetRef, Targetable};
use crate::RuntimeConfig;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One targetable in a rebuild request, tagged with which Gateway API
/// bucket it belongs in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTargetable {
    pub role: TargetableRole,
    #[serde(default)]
    pub namespace: Option<String>,
    pub name: String,
    #[serde(default)]
    pub attributes: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetableRole {
    GatewayClass,
    Gateway,
    HttpRoute,
    GrpcRoute,
    TcpRoute,
    TlsRoute,
    UdpRoute,
    Service,
}

/// One policy in a rebuild request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPolicy {
    pub group: String,
    pub kind: String,
    #[serde(default)]
    pub namespace: Option<String>,
    pub name: String,
    pub target_refs: Vec<RawTargetRef>,
    pub merge_strategy: crate::MergeStrategy,
    #[serde(default)]
    pub rules: Vec<RawRule>,
    #[serde(default)]
    pub spec: serde_json::Value,
    #[serde(default = "Utc::now")]
    pub creation_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTargetRef {
    pub group: String,
    pub kind: String,
    #[serde(default)]
    pub namespace: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRule {
    pub id: String,
    pub payload: serde_json::Value,
}

/// A full rebuild request: every targetable and policy currently observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildRequest {
    #[serde(default)]
    pub targetables: Vec<RawTargetable>,
    #[serde(default)]
    pub policies: Vec<RawPolicy>,
}

pub fn build_topology(
    request: RebuildRequest,
    config: &RuntimeConfig,
) -> Result<(Topology, Vec<TopologyWarning>), ConstructionError> {
    let mut builder = GatewayApiBuilder::new()
        .expand_listeners(config.expand_listeners)
        .expand_route_rules(config.expand_route_rules)
        .expand_service_ports(config.expand_service_ports)
        .strict_backend_refs(config.strict_backend_refs);

    let mut buckets: std::collections::HashMap<&'static str, Vec<Targetable>> = std::collections::HashMap::new();
    for raw in request.targetables {
        let kind = role_kind(raw.role);
        let targetable = Targetable::new(kind, raw.namespace, raw.name).with_attributes(raw.attributes);
        buckets.entry(bucket_key(raw.role)).or_default().push(targetable);
    }
    builder = builder
        .with_gateway_classes(buckets.remove("gateway_class").unwrap_or_default())
        .with_gateways(buckets.remove("gateway").unwrap_or_default())
        .with_http_routes(buckets.remove("http_route").unwrap_or_default())
        .with_grpc_routes(buckets.remove("grpc_route").unwrap_or_default())
        .with_tcp_routes(buckets.remove("tcp_route").unwrap_or_default())
        .with_tls_routes(buckets.remove("tls_route").unwrap_or_default())
        .with_udp_routes(buckets.remove("udp_route").unwrap_or_default())
        .with_services(buckets.remove("service").unwrap_or_default());

    let policies: Vec<Policy> = request
        .policies
        .into_iter()
        .map(|p| {
            Policy::new(
                GroupKind::new(p.group, p.kind),
                p.namespace,
                p.name,
                p.target_refs
                    .into_iter()
                    .map(|t| TargetRef::new(GroupKind::new(t.group, t.kind), t.namespace, t.name))
                    .collect(),
                p.merge_strategy,
                p.rules.into_iter().map(|r| Rule::new(r.id, r.payload)).collect(),
                p.spec,
                p.creation_timestamp,
            )
        })
        .collect();
    builder = builder.with_policies(policies);

    builder.build(config.topology_options())
}

fn role_kind(role: TargetableRole) -> GroupKind {
    use crate::gateway::kinds;
    match role {
        TargetableRole::GatewayClass => kinds::gateway_class(),
        TargetableRole::Gateway => kinds::gateway(),
        TargetableRole::HttpRoute => kinds::http_route(),
        TargetableRole::GrpcRoute => kinds::grpc_route(),
        TargetableRole::TcpRoute => kinds::tcp_route(),
        TargetableRole::TlsRoute => kinds::tls_route(),
        TargetableRole::UdpRoute => kinds::udp_route(),
        TargetableRole::Service => kinds::service(),
    }
}

fn bucket_key(role: TargetableRole) -> &'static str {
    match role {
        TargetableRole::GatewayClass => "gateway_class",
        TargetableRole::Gateway => "gateway",
        TargetableRole::HttpRoute => "http_route",
        TargetableRole::GrpcRoute => "grpc_route",
        TargetableRole::TcpRoute => "tcp_route",
        TargetableRole::TlsRoute => "tls_route",
        TargetableRole::UdpRoute => "udp_route",
        TargetableRole::Service => "service",
    }
}

/// Shared, cloneable service state: the most recently built topology (if
/// any) behind a reader-writer lock, plus the configuration it honors.
#[derive(Clone)]
pub struct ServiceState {
    topology: Arc<RwLock<Option<Arc<Topology>>>>,
    pub config: Arc<RuntimeConfig>,
}

impl ServiceState {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            topology: Arc::new(RwLock::new(None)),
            config: Arc::new(config),
        }
    }

    pub fn current(&self) -> Option<Arc<Topology>> {
        self.topology.read().clone()
    }

    pub fn replace(&self, topology: Topology) {
        *self.topology.write() = Some(Arc::new(topology));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_topology_from_a_minimal_request_matches_scenario_1() {
        let request = RebuildRequest {
            targetables: vec![
                RawTargetable {
                    role: TargetableRole::Gateway,
                    namespace: Some("ns".into()),
                    name: "g".into(),
                    attributes: serde_json::json!({"gateway_class_name": "gc", "listeners": []}),
                },
                RawTargetable {
                    role: TargetableRole::HttpRoute,
                    namespace: Some("ns".into()),
                    name: "r".into(),
                    attributes: serde_json::json!({"parent_refs": [{"name": "g"}]}),
                },
            ],
            policies: vec![],
        };
        let (topo, _) = build_topology(request, &RuntimeConfig::default()).unwrap();
        assert!(topo.roots_targetables().len() >= 1);
    }
}
