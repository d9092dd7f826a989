//! Diff-engine operation vocabulary (§3, §4.4).
//!
//! `DiffOperation` is a tagged union over the host-facing operation shapes.
//! It is purely data — validated and applied by `n8n-mcp-diffengine`, never
//! mutated in place. `UpdateNodePatch` models the deep-merge target for
//! `updateNode`: everything except `parameters` replaces wholesale;
//! `parameters` deep-merges so callers can patch a single nested key.

use crate::workflow::{ConnectionKind, Connections, Node};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How a batch of operations is applied (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApplyMode {
    #[default]
    Atomic,
    ContinueOnError,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_version: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A single high-level graph operation (§4.4).
///
/// `addConnection`'s `source_index` is an `Option<usize>` precisely so that
/// `Some(0)` can be told apart from "not supplied" — §4.4 requires treating
/// an explicit `0` as authoritative, never coerced to a default as if it
/// were falsy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DiffOperation {
    AddNode {
        node: Node,
    },
    RemoveNode {
        name: String,
    },
    UpdateNode {
        name: String,
        patch: UpdateNodePatch,
    },
    MoveNode {
        name: String,
        position: (f64, f64),
    },
    EnableNode {
        name: String,
    },
    DisableNode {
        name: String,
    },
    AddConnection {
        source: String,
        target: String,
        #[serde(default)]
        source_index: Option<usize>,
        #[serde(default)]
        target_index: usize,
        #[serde(default = "default_main")]
        kind: ConnectionKind,
        /// Ergonomic alias: `"true"`/`"false"` -> `source_index` 0/1 on a
        /// conditional node.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
        /// Ergonomic alias: maps to `source_index` on a switch node.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        case: Option<usize>,
    },
    RemoveConnection {
        source: String,
        target: String,
        #[serde(default)]
        source_index: Option<usize>,
        #[serde(default = "default_main")]
        kind: ConnectionKind,
    },
    RewireConnection {
        source: String,
        from: String,
        to: String,
        #[serde(default)]
        source_index: Option<usize>,
        #[serde(default = "default_main")]
        kind: ConnectionKind,
    },
    CleanStaleConnections,
    ReplaceConnections {
        connections: Connections,
    },
    UpdateSettings {
        patch: Map<String, Value>,
    },
    UpdateName {
        name: String,
    },
    AddTag {
        tag: String,
    },
    RemoveTag {
        tag: String,
    },
}

fn default_main() -> ConnectionKind {
    ConnectionKind::Main
}

impl DiffOperation {
    /// Resolve `addConnection`'s effective source index from the explicit
    /// field and the `branch`/`case` ergonomic aliases. Explicit
    /// `source_index` always wins; `Some(0)` is honored as-is.
    pub fn resolve_add_connection_source_index(
        source_index: Option<usize>,
        branch: Option<&str>,
        case: Option<usize>,
    ) -> usize {
        if let Some(idx) = source_index {
            return idx;
        }
        if let Some(b) = branch {
            return if b == "false" { 1 } else { 0 };
        }
        if let Some(c) = case {
            return c;
        }
        0
    }
}

/// Per-operation outcome in a `continueOnError` batch, or the single
/// failure reported by an `atomic` batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult {
    pub index: usize,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_zero_source_index_is_honored() {
        let idx = DiffOperation::resolve_add_connection_source_index(Some(0), Some("false"), None);
        assert_eq!(idx, 0, "explicit Some(0) must not be overridden by branch alias");
    }

    #[test]
    fn branch_alias_maps_true_false_to_0_1() {
        assert_eq!(
            DiffOperation::resolve_add_connection_source_index(None, Some("true"), None),
            0
        );
        assert_eq!(
            DiffOperation::resolve_add_connection_source_index(None, Some("false"), None),
            1
        );
    }

    #[test]
    fn case_alias_maps_directly() {
        assert_eq!(
            DiffOperation::resolve_add_connection_source_index(None, None, Some(3)),
            3
        );
    }

    #[test]
    fn parses_add_connection_from_json() {
        let raw = serde_json::json!({
            "op": "addConnection",
            "source": "If",
            "target": "SetTrue",
            "branch": "true"
        });
        let op: DiffOperation = serde_json::from_value(raw).unwrap();
        match op {
            DiffOperation::AddConnection { source, target, branch, .. } => {
                assert_eq!(source, "If");
                assert_eq!(target, "SetTrue");
                assert_eq!(branch.as_deref(), Some("true"));
            }
            _ => panic!("wrong variant"),
        }
    }
}
