//! Effective-policy computation: flatten a path's attached policies
//! (least-specific first) and right-reduce with `merge` (§4.C).

use crate::policy::merge;
use crate::types::{attachment_order_key, Policy};
use std::sync::Arc;

/// Flatten `[n0.attachedPolicies, n1.attachedPolicies, ..., nk.attachedPolicies]`
/// (each re-sorted by ascending creation timestamp, ties by
/// `namespace/name`) and right-reduce with `merge`. Returns `None` if no
/// node on the path carries any attached policy.
pub fn effective_policy(per_node_attached: &[Vec<Arc<Policy>>]) -> Option<Policy> {
    let mut flat: Vec<Arc<Policy>> = Vec::new();
    for node_policies in per_node_attached {
        let mut sorted = node_policies.clone();
        sorted.sort_by_key(|p| attachment_order_key(p));
        flat.extend(sorted);
    }

    let mut iter = flat.into_iter().rev();
    let mut acc = iter.next()?;
    for more_general in iter {
        let merged = merge(&more_general, &acc);
        acc = Arc::new(merged);
    }
    Some((*acc).clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GroupKind, MergeStrategy, Rule, TargetRef};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn policy(name: &str, creation_secs: i64, rules: Vec<Rule>) -> Arc<Policy> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Arc::new(Policy::new(
            GroupKind::core("TestPolicy"),
            Some("ns".into()),
            name,
            vec![TargetRef::new(GroupKind::core("Service"), Some("ns".into()), "svc")],
            MergeStrategy::RuleDefaults,
            rules,
            serde_json::Value::Null,
            base + Duration::seconds(creation_secs),
        ))
    }

    #[test]
    fn multi_policy_ordering_matches_scenario_5() {
        // p1 creation=2s, p2 creation=1s => ascending attached order [p2, p1]
        let p1 = policy("p1", 2, vec![Rule::new("a", json!(1))]);
        let p2 = policy("p2", 1, vec![Rule::new("b", json!(2))]);
        let effective = effective_policy(&[vec![p1, p2]]).unwrap();
        let ids: Vec<&str> = effective.rules.iter().map(|r| r.id.as_str()).collect();
        assert!(ids.contains(&"a"));
        assert!(ids.contains(&"b"));
    }

    #[test]
    fn empty_path_attachment_yields_none() {
        assert!(effective_policy(&[vec![], vec![]]).is_none());
    }
}
