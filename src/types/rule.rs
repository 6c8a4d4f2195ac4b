//! Rule-level policy payloads.

use serde::{Deserialize, Serialize};

/// A single named rule within a policy. Ids are unique within one policy;
/// the payload is opaque to the merge algebra beyond identity comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub payload: serde_json::Value,
}

impl Rule {
    pub fn new(id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}
