//! Roots/Parents/Children/Paths queries over a built graph.

use super::graph::Graph;
use crate::types::Locator;
use std::collections::BTreeSet;

/// Nodes with no incoming edges, restricted to the locators for which
/// `in_category` returns true.
pub fn roots(graph: &Graph, in_category: impl Fn(&Locator) -> bool) -> Vec<Locator> {
    graph
        .nodes()
        .filter(|n| in_category(n) && graph.has_no_incoming(n))
        .cloned()
        .collect()
}

pub fn parents(graph: &Graph, node: &Locator, in_category: impl Fn(&Locator) -> bool) -> Vec<Locator> {
    graph.parents(node).filter(|n| in_category(n)).cloned().collect()
}

pub fn children(graph: &Graph, node: &Locator, in_category: impl Fn(&Locator) -> bool) -> Vec<Locator> {
    graph.children(node).filter(|n| in_category(n)).cloned().collect()
}

/// Enumerate every simple path from `from` to `to` via DFS with a visited
/// set. `Paths(a, a) == [[a]]`, and the result is never an error, only
/// possibly empty (§4.C, §8).
pub fn paths(graph: &Graph, from: &Locator, to: &Locator) -> Vec<Vec<Locator>> {
    if from == to {
        return vec![vec![from.clone()]];
    }
    let mut results = Vec::new();
    let mut visited: BTreeSet<Locator> = BTreeSet::new();
    let mut current = vec![from.clone()];
    visited.insert(from.clone());
    dfs(graph, from, to, &mut visited, &mut current, &mut results);
    results
}

fn dfs(
    graph: &Graph,
    at: &Locator,
    to: &Locator,
    visited: &mut BTreeSet<Locator>,
    current: &mut Vec<Locator>,
    results: &mut Vec<Vec<Locator>>,
) {
    for child in graph.children(at) {
        if child == to {
            current.push(child.clone());
            results.push(current.clone());
            current.pop();
            continue;
        }
        if visited.contains(child) {
            continue;
        }
        visited.insert(child.clone());
        current.push(child.clone());
        dfs(graph, child, to, visited, current, results);
        current.pop();
        visited.remove(child);
    }
}
