//! Policies, target references, and the closed set of merge strategies.

use crate::types::object::{GroupKind, Locator, Object};
use crate::types::rule::Rule;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reference to the object a policy targets. A target reference is
/// itself an [`Object`]; its locator MUST equal the locator of the node it
/// denotes, defaulting the namespace to the owning policy's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRef {
    pub group_kind: GroupKind,
    pub namespace: Option<String>,
    pub name: String,
    /// Optional section (listener/route-rule/service-port name) to target
    /// a section-scoped node rather than the parent.
    pub section: Option<String>,
}

impl TargetRef {
    pub fn new(group_kind: GroupKind, namespace: Option<String>, name: impl Into<String>) -> Self {
        Self {
            group_kind,
            namespace,
            name: name.into(),
            section: None,
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Resolve this reference's locator, defaulting the namespace to the
    /// owning policy's namespace when the reference omits one.
    pub fn locator(&self, policy_namespace: Option<&str>) -> Locator {
        let ns = self.namespace.as_deref().or(policy_namespace);
        let name = match &self.section {
            Some(section) => format!("{}#{}", self.name, section),
            None => self.name.clone(),
        };
        Locator::build(&self.group_kind, ns, &name)
    }
}

/// The closed set of merge strategies recognized by the core. Additional
/// variants may be added without affecting existing ones (the enum lives
/// behind a single `merge` entry point, see [`crate::policy::merge`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeStrategy {
    AtomicDefaults,
    AtomicOverrides,
    RuleDefaults,
    RuleOverrides,
    JsonMergePatchDefaults,
    JsonMergePatchOverrides,
}

/// A policy attaching to one or more targetables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub group_kind: GroupKind,
    pub namespace: Option<String>,
    pub name: String,
    pub target_refs: Vec<TargetRef>,
    pub merge_strategy: MergeStrategy,
    pub rules: Vec<Rule>,
    /// Raw policy spec body, consulted by the JSON-merge-patch strategies.
    pub spec: serde_json::Value,
    pub creation_timestamp: DateTime<Utc>,
}

impl Policy {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        group_kind: GroupKind,
        namespace: Option<String>,
        name: impl Into<String>,
        target_refs: Vec<TargetRef>,
        merge_strategy: MergeStrategy,
        rules: Vec<Rule>,
        spec: serde_json::Value,
        creation_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            group_kind,
            namespace,
            name: name.into(),
            target_refs,
            merge_strategy,
            rules,
            spec,
            creation_timestamp,
        }
    }

    /// An "empty" policy for merge-identity purposes: no rules and a null
    /// spec body. Not a graph node; only used as a merge operand.
    pub fn empty_like(template: &Policy) -> Policy {
        Policy {
            group_kind: template.group_kind.clone(),
            namespace: template.namespace.clone(),
            name: template.name.clone(),
            target_refs: template.target_refs.clone(),
            merge_strategy: template.merge_strategy,
            rules: Vec::new(),
            spec: serde_json::Value::Null,
            creation_timestamp: template.creation_timestamp,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && matches!(self.spec, serde_json::Value::Null)
    }
}

impl Object for Policy {
    fn group_kind(&self) -> &GroupKind {
        &self.group_kind
    }

    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.locator())
    }
}

/// Ordering key for policies attached to the same targetable: ascending
/// creation timestamp, ties broken by lexicographic `namespace/name`.
pub fn attachment_order_key(p: &Policy) -> (DateTime<Utc>, String) {
    let ns_name = format!("{}/{}", p.namespace.as_deref().unwrap_or(""), p.name);
    (p.creation_timestamp, ns_name)
}
