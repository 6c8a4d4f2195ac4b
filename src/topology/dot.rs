//! Pure DOT projection of a built topology (§6: stable visual contract).

use crate::types::{GroupKind, Locator};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    Targetable,
    Policy,
    Free,
}

pub struct DotNode<'a> {
    pub locator: &'a Locator,
    pub category: NodeCategory,
}

pub struct DotEdge<'a> {
    pub from: &'a Locator,
    pub to: &'a Locator,
    pub from_kind: &'a GroupKind,
    pub to_kind: &'a GroupKind,
}

pub struct DotPolicyEdge<'a> {
    pub policy: &'a Locator,
    pub target: &'a Locator,
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Render a DOT graph with box-shaped targetables (grey fill), note-shaped
/// policies (dashed border), ellipse-shaped free objects, solid edges
/// carrying a `comment` of `"<FromKind> -> <ToKind>"`, and a dashed edge
/// from every policy to each of its resolved targets.
pub fn render(nodes: &[DotNode<'_>], edges: &[DotEdge<'_>], policy_edges: &[DotPolicyEdge<'_>]) -> String {
    let mut out = String::new();
    out.push_str("digraph Topology {\n");
    for node in nodes {
        let id = quote(node.locator.as_str());
        match node.category {
            NodeCategory::Targetable => {
                let _ = writeln!(out, "  {} [shape=box, style=filled, fillcolor=grey];", id);
            }
            NodeCategory::Policy => {
                let _ = writeln!(out, "  {} [shape=note, style=dashed];", id);
            }
            NodeCategory::Free => {
                let _ = writeln!(out, "  {} [shape=ellipse];", id);
            }
        }
    }
    for edge in edges {
        let comment = format!("{} -> {}", edge.from_kind, edge.to_kind);
        let _ = writeln!(
            out,
            "  {} -> {} [comment={}];",
            quote(edge.from.as_str()),
            quote(edge.to.as_str()),
            quote(&comment)
        );
    }
    for pe in policy_edges {
        let _ = writeln!(
            out,
            "  {} -> {} [style=dashed];",
            quote(pe.policy.as_str()),
            quote(pe.target.as_str())
        );
    }
    out.push_str("}\n");
    out
}
