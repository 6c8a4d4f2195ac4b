//! The typed object graph: construction, indexing, queries, and DOT/
//! effective-policy projections (§4.C).

pub mod dot;
pub mod effective;
pub mod graph;
pub mod query;

use crate::types::{GroupKind, Locator, Object, Policy, Targetable};
use dot::{DotEdge, DotNode, DotPolicyEdge, NodeCategory};
use graph::Graph;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// A link function: for every node whose kind equals `to_kind`, `resolve`
/// is invoked to find candidate parent locators; each one that exists as a
/// graph node yields a `parent -> child` edge (§3, §4.C step 4).
#[derive(Clone)]
pub struct LinkFunction {
    pub from_kind: GroupKind,
    pub to_kind: GroupKind,
    pub resolve: Arc<dyn Fn(&dyn Object) -> Vec<Locator> + Send + Sync>,
}

impl LinkFunction {
    pub fn new(
        from_kind: GroupKind,
        to_kind: GroupKind,
        resolve: impl Fn(&dyn Object) -> Vec<Locator> + Send + Sync + 'static,
    ) -> Self {
        Self {
            from_kind,
            to_kind,
            resolve: Arc::new(resolve),
        }
    }
}

/// Options accepted by [`Topology::build`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TopologyOptions {
    /// When `false` (default), a cycle aborts construction. When `true`,
    /// the graph is retained as-is; path enumeration's visited-set
    /// bookkeeping keeps it terminating (§9 Open Questions).
    pub allow_loops: bool,
    /// When `true`, a duplicate locator or an unresolvable link target is a
    /// hard [`ConstructionError`] rather than a warning (§7: "surfaced at
    /// `NewTopology` time when strict").
    pub strict: bool,
}

/// Non-fatal construction-time diagnostics, returned alongside the built
/// topology rather than logged directly (callers decide whether/how).
#[derive(Debug, Clone)]
pub enum TopologyWarning {
    DuplicateLocator { locator: Locator, kind: GroupKind },
}

#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("cycle detected among {0:?}")]
    CycleDetected(Vec<Locator>),
    #[error("duplicate locator {locator} ({kind})")]
    DuplicateLocator { locator: Locator, kind: GroupKind },
    #[error("link from {from} to unresolvable target {expected}")]
    UnresolvableLinkTarget { from: Locator, expected: Locator },
}

/// Three keyed indexes (targetables, policies, free objects) by locator,
/// plus the underlying directed graph and the per-targetable attached-
/// policy sets computed once at construction time.
pub struct Topology {
    targetables: BTreeMap<Locator, Arc<Targetable>>,
    policies: BTreeMap<Locator, Arc<Policy>>,
    objects: BTreeMap<Locator, Arc<dyn Object>>,
    node_kind: BTreeMap<Locator, GroupKind>,
    dyn_objects: BTreeMap<Locator, Arc<dyn Object>>,
    graph: Graph,
    attached: BTreeMap<Locator, Vec<Arc<Policy>>>,
    policy_edges: Vec<(Locator, Locator)>,
}

impl Topology {
    /// Construct a topology from its inputs (§4.C `NewTopology`).
    pub fn build(
        targetables: Vec<Targetable>,
        policies: Vec<Policy>,
        objects: Vec<Arc<dyn Object>>,
        link_functions: &[LinkFunction],
        options: TopologyOptions,
    ) -> Result<(Self, Vec<TopologyWarning>), ConstructionError> {
        let mut warnings = Vec::new();
        let mut node_kind: BTreeMap<Locator, GroupKind> = BTreeMap::new();
        let mut dyn_objects: BTreeMap<Locator, Arc<dyn Object>> = BTreeMap::new();

        let mut targetable_map: BTreeMap<Locator, Arc<Targetable>> = BTreeMap::new();
        for t in targetables {
            let t = Arc::new(t);
            let locator = t.locator();
            admit(&mut node_kind, &mut warnings, &locator, t.group_kind().clone(), options.strict)?;
            dyn_objects.insert(locator.clone(), t.clone() as Arc<dyn Object>);
            targetable_map.insert(locator, t);
        }

        let mut policy_map: BTreeMap<Locator, Arc<Policy>> = BTreeMap::new();
        // Kept alongside `policy_map` (locator-keyed, for O(log n) lookup)
        // so the attachment step below can walk policies in their original
        // input order rather than locator-sorted order.
        let mut policy_order: Vec<(Locator, Arc<Policy>)> = Vec::new();
        for p in policies {
            let p = Arc::new(p);
            let locator = p.locator();
            admit(&mut node_kind, &mut warnings, &locator, p.group_kind().clone(), options.strict)?;
            dyn_objects.insert(locator.clone(), p.clone() as Arc<dyn Object>);
            policy_order.push((locator.clone(), p.clone()));
            policy_map.insert(locator, p);
        }

        let mut object_map: BTreeMap<Locator, Arc<dyn Object>> = BTreeMap::new();
        for o in objects {
            let locator = o.locator();
            admit(&mut node_kind, &mut warnings, &locator, o.group_kind().clone(), options.strict)?;
            dyn_objects.insert(locator.clone(), o.clone());
            object_map.insert(locator, o);
        }

        // Step 1 + 2: policy indexing and attachment, preserving policy
        // input order.
        let mut by_target: BTreeMap<Locator, Vec<Arc<Policy>>> = BTreeMap::new();
        let mut policy_edges = Vec::new();
        for (policy_locator, policy) in policy_order.iter() {
            for target_ref in &policy.target_refs {
                let target_locator = target_ref.locator(policy.namespace.as_deref());
                if dyn_objects.contains_key(&target_locator) {
                    policy_edges.push((policy_locator.clone(), target_locator.clone()));
                }
                by_target.entry(target_locator).or_default().push(policy.clone());
            }
        }
        let mut attached: BTreeMap<Locator, Vec<Arc<Policy>>> = BTreeMap::new();
        for (locator, _) in targetable_map.iter() {
            let list = by_target.get(locator).cloned().unwrap_or_default();
            attached.insert(locator.clone(), list);
        }

        // Step 3: node admission already done above via `admit`.
        let mut graph = Graph::new();
        for locator in node_kind.keys() {
            graph.add_node(locator);
        }

        // Step 4: edge formation.
        for link in link_functions {
            for (child_locator, child_kind) in node_kind.iter() {
                if child_kind != &link.to_kind {
                    continue;
                }
                let child_object = dyn_objects.get(child_locator).expect("admitted node");
                let candidates = (link.resolve)(child_object.as_ref());
                for parent_locator in candidates {
                    if dyn_objects.contains_key(&parent_locator) {
                        graph.add_edge(&parent_locator, child_locator, link.from_kind.clone(), link.to_kind.clone());
                    } else if options.strict {
                        return Err(ConstructionError::UnresolvableLinkTarget {
                            from: child_locator.clone(),
                            expected: parent_locator,
                        });
                    }
                }
            }
        }

        // Step 5: cycle check.
        if !options.allow_loops {
            if let Err(cycle) = graph.topological_check() {
                return Err(ConstructionError::CycleDetected(cycle));
            }
        }

        Ok((
            Topology {
                targetables: targetable_map,
                policies: policy_map,
                objects: object_map,
                node_kind,
                dyn_objects,
                graph,
                attached,
                policy_edges,
            },
            warnings,
        ))
    }

    pub fn targetable(&self, locator: &Locator) -> Option<&Arc<Targetable>> {
        self.targetables.get(locator)
    }

    pub fn policy(&self, locator: &Locator) -> Option<&Arc<Policy>> {
        self.policies.get(locator)
    }

    pub fn object(&self, locator: &Locator) -> Option<&Arc<dyn Object>> {
        self.objects.get(locator)
    }

    /// The policies attached to a targetable, in input order (ordering for
    /// merge purposes is re-derived by `effective_policy`, not here).
    pub fn attached_policies(&self, locator: &Locator) -> &[Arc<Policy>] {
        self.attached.get(locator).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn roots_targetables(&self) -> Vec<Locator> {
        query::roots(&self.graph, |l| self.targetables.contains_key(l))
    }

    pub fn parents_targetables(&self, node: &Locator) -> Vec<Locator> {
        query::parents(&self.graph, node, |l| self.targetables.contains_key(l))
    }

    pub fn children_targetables(&self, node: &Locator) -> Vec<Locator> {
        query::children(&self.graph, node, |l| self.targetables.contains_key(l))
    }

    pub fn paths(&self, from: &Locator, to: &Locator) -> Vec<Vec<Locator>> {
        query::paths(&self.graph, from, to)
    }

    /// Compute the effective policy over a path by collecting each node's
    /// attached policies and right-reducing with `merge` (§4.C, §6).
    pub fn effective_policy(&self, path: &[Locator]) -> Option<Policy> {
        let per_node: Vec<Vec<Arc<Policy>>> =
            path.iter().map(|l| self.attached_policies(l).to_vec()).collect();
        effective::effective_policy(&per_node)
    }

    pub fn to_dot(&self) -> String {
        let category = |locator: &Locator| -> NodeCategory {
            if self.targetables.contains_key(locator) {
                NodeCategory::Targetable
            } else if self.policies.contains_key(locator) {
                NodeCategory::Policy
            } else {
                NodeCategory::Free
            }
        };
        let nodes: Vec<DotNode<'_>> = self
            .node_kind
            .keys()
            .map(|l| DotNode {
                locator: l,
                category: category(l),
            })
            .collect();
        let edges: Vec<DotEdge<'_>> = self
            .graph
            .edges()
            .map(|(from, to, meta)| DotEdge {
                from,
                to,
                from_kind: &meta.from_kind,
                to_kind: &meta.to_kind,
            })
            .collect();
        let policy_edges: Vec<DotPolicyEdge<'_>> = self
            .policy_edges
            .iter()
            .map(|(p, t)| DotPolicyEdge { policy: p, target: t })
            .collect();
        dot::render(&nodes, &edges, &policy_edges)
    }
}

fn admit(
    node_kind: &mut BTreeMap<Locator, GroupKind>,
    warnings: &mut Vec<TopologyWarning>,
    locator: &Locator,
    kind: GroupKind,
    strict: bool,
) -> Result<(), ConstructionError> {
    if node_kind.contains_key(locator) {
        if strict {
            return Err(ConstructionError::DuplicateLocator {
                locator: locator.clone(),
                kind,
            });
        }
        warnings.push(TopologyWarning::DuplicateLocator {
            locator: locator.clone(),
            kind: kind.clone(),
        });
    }
    node_kind.insert(locator.clone(), kind);
    Ok(())
}
