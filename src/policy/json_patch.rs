//! RFC 7396 JSON Merge Patch, applied to the "proper spec" projection used
//! by the JSON-merge-patch strategies.

use serde_json::{Map, Value};

/// The canonical spec projection for a JSON-merge-patch policy: prefer
/// `defaults`, then `overrides`, then the bare spec body.
pub fn proper_spec(spec: &Value) -> Value {
    if let Some(obj) = spec.as_object() {
        if let Some(defaults) = obj.get("defaults") {
            return defaults.clone();
        }
        if let Some(overrides) = obj.get("overrides") {
            return overrides.clone();
        }
    }
    spec.clone()
}

/// Apply `patch` onto `base` per RFC 7396, with two accommodations needed
/// to satisfy the merge-identity law for "empty" policies (§8):
/// - a `Null` patch is a no-op (the base survives unchanged), rather than
///   RFC 7396's literal "replace with null".
/// - a non-object base paired with an object patch is treated as an empty
///   object base, so patching onto an absent/empty spec yields the patch.
pub fn apply_merge_patch(base: Value, patch: Value) -> Value {
    if patch.is_null() {
        return base;
    }
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            Value::Object(apply_object_patch(base_map, patch_map))
        }
        (base, Value::Object(patch_map)) if !base.is_object() => {
            Value::Object(apply_object_patch(Map::new(), patch_map))
        }
        (_, patch) => patch,
    }
}

fn apply_object_patch(mut base: Map<String, Value>, patch: Map<String, Value>) -> Map<String, Value> {
    for (key, patch_value) in patch {
        if patch_value.is_null() {
            base.remove(&key);
            continue;
        }
        let merged = match base.remove(&key) {
            Some(existing) => apply_merge_patch(existing, patch_value),
            None => apply_merge_patch(Value::Null, patch_value),
        };
        base.insert(key, merged);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_patch_is_noop() {
        let base = json!({"a": 1});
        assert_eq!(apply_merge_patch(base.clone(), Value::Null), base);
    }

    #[test]
    fn object_patch_onto_null_base_yields_patch() {
        let merged = apply_merge_patch(Value::Null, json!({"a": 1}));
        assert_eq!(merged, json!({"a": 1}));
    }

    #[test]
    fn nested_keys_merge_recursively() {
        let base = json!({"a": {"x": 1, "y": 2}, "b": 3});
        let patch = json!({"a": {"y": 5, "z": null}}, );
        let merged = apply_merge_patch(base, patch);
        assert_eq!(merged, json!({"a": {"x": 1, "y": 5}, "b": 3}));
    }

    #[test]
    fn proper_spec_prefers_defaults_then_overrides_then_body() {
        assert_eq!(proper_spec(&json!({"defaults": {"a": 1}, "overrides": {"a": 2}})), json!({"a": 1}));
        assert_eq!(proper_spec(&json!({"overrides": {"a": 2}})), json!({"a": 2}));
        assert_eq!(proper_spec(&json!({"a": 3})), json!({"a": 3}));
    }
}
