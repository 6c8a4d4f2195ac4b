//! The merge algebra: `merge(source, target) -> Policy` dispatches on the
//! target's declared [`MergeStrategy`]. "Source" is the less-specific
//! (ancestor) policy, "target" is the more-specific one; the result always
//! carries the target's identity and target references, per the
//! attachment-soundness invariant (§3, §8).

pub mod json_patch;

use crate::types::{MergeStrategy, Policy, Rule};
use json_patch::{apply_merge_patch, proper_spec};

/// Merge `source` (less specific) into `target` (more specific), dispatching
/// on `target.merge_strategy`. The result always keeps `target`'s identity
/// and target references.
pub fn merge(source: &Policy, target: &Policy) -> Policy {
    match target.merge_strategy {
        MergeStrategy::AtomicDefaults => atomic_defaults(source, target),
        MergeStrategy::AtomicOverrides => atomic_overrides(source, target),
        MergeStrategy::RuleDefaults => rule_defaults(source, target),
        MergeStrategy::RuleOverrides => rule_overrides(source, target),
        MergeStrategy::JsonMergePatchDefaults => json_merge_patch_defaults(source, target),
        MergeStrategy::JsonMergePatchOverrides => json_merge_patch_overrides(source, target),
    }
}

fn with_target_identity(target: &Policy, rules: Vec<Rule>, spec: serde_json::Value) -> Policy {
    Policy {
        group_kind: target.group_kind.clone(),
        namespace: target.namespace.clone(),
        name: target.name.clone(),
        target_refs: target.target_refs.clone(),
        merge_strategy: target.merge_strategy,
        rules,
        spec,
        creation_timestamp: target.creation_timestamp,
    }
}

/// Returns target if target has rules, else source.
fn atomic_defaults(source: &Policy, target: &Policy) -> Policy {
    if !target.rules.is_empty() {
        with_target_identity(target, target.rules.clone(), target.spec.clone())
    } else {
        with_target_identity(target, source.rules.clone(), source.spec.clone())
    }
}

/// Returns source, unless source is empty (no rules) in which case target
/// survives — the identity-law accommodation documented in `DESIGN.md`.
fn atomic_overrides(source: &Policy, target: &Policy) -> Policy {
    if !source.rules.is_empty() {
        with_target_identity(target, source.rules.clone(), source.spec.clone())
    } else {
        with_target_identity(target, target.rules.clone(), target.spec.clone())
    }
}

/// Target extended with those source rules whose id is absent from target;
/// preserves target rule order, appends missing source rules in source order.
fn rule_defaults(source: &Policy, target: &Policy) -> Policy {
    let mut rules = target.rules.clone();
    let present: std::collections::HashSet<&str> = rules.iter().map(|r| r.id.as_str()).collect();
    for rule in &source.rules {
        if !present.contains(rule.id.as_str()) {
            rules.push(rule.clone());
        }
    }
    with_target_identity(target, rules, target.spec.clone())
}

/// For each target rule present in source, substitute the source rule
/// (preserving target order for shared ids); then append source-only rules
/// in source order.
fn rule_overrides(source: &Policy, target: &Policy) -> Policy {
    let source_by_id: std::collections::HashMap<&str, &Rule> =
        source.rules.iter().map(|r| (r.id.as_str(), r)).collect();
    let mut rules: Vec<Rule> = target
        .rules
        .iter()
        .map(|t| source_by_id.get(t.id.as_str()).map(|s| (*s).clone()).unwrap_or_else(|| t.clone()))
        .collect();
    let target_ids: std::collections::HashSet<&str> = target.rules.iter().map(|r| r.id.as_str()).collect();
    for rule in &source.rules {
        if !target_ids.contains(rule.id.as_str()) {
            rules.push(rule.clone());
        }
    }
    with_target_identity(target, rules, target.spec.clone())
}

/// Applies the source (parent) spec as a JSON merge patch onto the target
/// (child) spec.
fn json_merge_patch_defaults(source: &Policy, target: &Policy) -> Policy {
    let base = proper_spec(&target.spec);
    let patch = proper_spec(&source.spec);
    let merged = apply_merge_patch(base, patch);
    with_target_identity(target, target.rules.clone(), merged)
}

/// Applies the target (child) spec as a JSON merge patch onto the source
/// (parent) spec.
fn json_merge_patch_overrides(source: &Policy, target: &Policy) -> Policy {
    let base = proper_spec(&source.spec);
    let patch = proper_spec(&target.spec);
    let merged = apply_merge_patch(base, patch);
    with_target_identity(target, target.rules.clone(), merged)
}
