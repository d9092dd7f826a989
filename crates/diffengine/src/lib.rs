//! Workflow Diff Engine (C1).
//!
//! Applies an ordered batch of [`DiffOperation`]s to a workflow document.
//! Every operation is validated against the *working copy* — which
//! accumulates prior operations in the same batch — immediately before
//! being applied, so no operation can leave the document in an invalid
//! intermediate state.

mod ops;

use n8n_mcp_domain::diffop::{ApplyMode, DiffOperation, OperationResult};
use n8n_mcp_domain::workflow::Workflow;
use n8n_mcp_domain::Error;

/// Result of applying a batch: the resulting document (unchanged from the
/// input when an atomic batch rolled back), per-operation outcomes, and
/// whether the batch committed.
pub struct ApplyOutcome {
    pub workflow: Workflow,
    pub results: Vec<OperationResult>,
    pub committed: bool,
}

/// Applies `operations` to `workflow` under `mode` (§4.4).
///
/// - `Atomic`: the first failing operation rolls back the whole batch;
///   the returned workflow is a clone of the input, unmodified, and
///   `committed` is `false`.
/// - `ContinueOnError`: failing operations are skipped (not applied) and
///   recorded; the workflow returned reflects every operation that did
///   succeed, and `committed` is `true`.
pub fn apply(workflow: &Workflow, operations: &[DiffOperation], mode: ApplyMode) -> ApplyOutcome {
    let mut working = workflow.clone();
    let mut results = Vec::with_capacity(operations.len());

    for (index, op) in operations.iter().enumerate() {
        match ops::apply_one(&mut working, op) {
            Ok(()) => results.push(OperationResult {
                index,
                applied: true,
                reason: None,
            }),
            Err(reason) => {
                results.push(OperationResult {
                    index,
                    applied: false,
                    reason: Some(reason.clone()),
                });
                match mode {
                    ApplyMode::Atomic => {
                        tracing::warn!(index, reason = %reason, "atomic batch rolled back");
                        return ApplyOutcome {
                            workflow: workflow.clone(),
                            results,
                            committed: false,
                        };
                    }
                    ApplyMode::ContinueOnError => {
                        tracing::debug!(index, reason = %reason, "operation skipped");
                    }
                }
            }
        }
    }

    ApplyOutcome {
        workflow: working,
        results,
        committed: true,
    }
}

/// Convenience wrapper for single-operation atomic application, returning
/// a domain [`Error::DiffFailure`] on failure instead of an outcome
/// struct — used by the auto-fixer's commit path where a partial batch
/// makes no sense.
pub fn apply_atomic_or_error(
    workflow: &Workflow,
    operations: &[DiffOperation],
) -> Result<Workflow, Error> {
    let outcome = apply(workflow, operations, ApplyMode::Atomic);
    if outcome.committed {
        Ok(outcome.workflow)
    } else {
        let failure = outcome
            .results
            .iter()
            .find(|r| !r.applied)
            .expect("rolled-back batch always has a failing result");
        Err(Error::DiffFailure {
            index: failure.index,
            reason: failure.reason.clone().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use n8n_mcp_domain::diffop::UpdateNodePatch;
    use n8n_mcp_domain::workflow::{ConnectionKind, Node};
    use serde_json::Map;

    fn node(id: &str, name: &str, node_type: &str) -> Node {
        Node {
            id: id.into(),
            name: name.into(),
            node_type: node_type.into(),
            type_version: 1.0,
            position: (0.0, 0.0),
            parameters: Map::new(),
            credentials: None,
            disabled: false,
            notes: None,
            on_error: None,
        }
    }

    fn empty_workflow() -> Workflow {
        Workflow {
            id: Some("wf1".into()),
            name: "Test".into(),
            nodes: vec![],
            connections: Default::default(),
            settings: None,
            active: None,
            tags: vec![],
            created_at: None,
            updated_at: None,
            version_id: None,
        }
    }

    #[test]
    fn atomic_batch_rolls_back_on_first_failure() {
        let wf = empty_workflow();
        let ops = vec![
            DiffOperation::AddNode {
                node: node("n1", "Start", "n8n-nodes-base.manualTrigger"),
            },
            DiffOperation::RemoveNode {
                name: "DoesNotExist".into(),
            },
        ];
        let outcome = apply(&wf, &ops, ApplyMode::Atomic);
        assert!(!outcome.committed);
        assert!(outcome.workflow.nodes.is_empty());
        assert!(outcome.results[0].applied);
        assert!(!outcome.results[1].applied);
    }

    #[test]
    fn continue_on_error_keeps_successful_operations() {
        let wf = empty_workflow();
        let ops = vec![
            DiffOperation::AddNode {
                node: node("n1", "Start", "n8n-nodes-base.manualTrigger"),
            },
            DiffOperation::RemoveNode {
                name: "DoesNotExist".into(),
            },
            DiffOperation::AddNode {
                node: node("n2", "Http", "n8n-nodes-base.httpRequest"),
            },
        ];
        let outcome = apply(&wf, &ops, ApplyMode::ContinueOnError);
        assert!(outcome.committed);
        assert_eq!(outcome.workflow.nodes.len(), 2);
        assert!(outcome.results[0].applied);
        assert!(!outcome.results[1].applied);
        assert!(outcome.results[2].applied);
    }

    #[test]
    fn add_connection_explicit_zero_source_index_is_honored() {
        let mut wf = empty_workflow();
        wf.nodes.push(node("n1", "If", "n8n-nodes-base.if"));
        wf.nodes.push(node("n2", "WhenTrue", "n8n-nodes-base.noOp"));
        let ops = vec![DiffOperation::AddConnection {
            source: "If".into(),
            target: "WhenTrue".into(),
            source_index: Some(0),
            target_index: 0,
            kind: ConnectionKind::Main,
            branch: Some("false".into()),
            case: None,
        }];
        let outcome = apply(&wf, &ops, ApplyMode::Atomic);
        assert!(outcome.committed);
        let slots = outcome
            .workflow
            .connections
            .slots("If", ConnectionKind::Main)
            .unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0][0].target_name, "WhenTrue");
    }

    #[test]
    fn remove_connection_truncates_trailing_only() {
        let mut wf = empty_workflow();
        for i in 0..4 {
            wf.nodes.push(node(&format!("n{i}"), &format!("H{i}"), "n8n-nodes-base.noOp"));
        }
        wf.nodes.push(node("s", "Switch", "n8n-nodes-base.switch"));
        for i in 0..4 {
            let slots = wf.connections.slots_mut("Switch", ConnectionKind::Main);
            while slots.len() <= i {
                slots.push(vec![]);
            }
            slots[i].push(n8n_mcp_domain::workflow::ConnectionEndpoint {
                target_name: format!("H{i}"),
                kind: ConnectionKind::Main,
                target_index: 0,
            });
        }
        let ops = vec![DiffOperation::RemoveConnection {
            source: "Switch".into(),
            target: "H1".into(),
            source_index: Some(1),
            kind: ConnectionKind::Main,
        }];
        let outcome = apply(&wf, &ops, ApplyMode::Atomic);
        assert!(outcome.committed);
        let slots = outcome
            .workflow
            .connections
            .slots("Switch", ConnectionKind::Main)
            .unwrap();
        assert_eq!(slots.len(), 4);
        assert!(slots[1].is_empty());
        assert!(!slots[3].is_empty());
    }

    #[test]
    fn remove_node_cleans_dangling_connections() {
        let mut wf = empty_workflow();
        wf.nodes.push(node("n1", "A", "n8n-nodes-base.noOp"));
        wf.nodes.push(node("n2", "B", "n8n-nodes-base.noOp"));
        wf.connections
            .slots_mut("A", ConnectionKind::Main)
            .push(vec![n8n_mcp_domain::workflow::ConnectionEndpoint {
                target_name: "B".into(),
                kind: ConnectionKind::Main,
                target_index: 0,
            }]);
        let ops = vec![DiffOperation::RemoveNode { name: "B".into() }];
        let outcome = apply(&wf, &ops, ApplyMode::Atomic);
        assert!(outcome.committed);
        assert!(outcome
            .workflow
            .connections
            .slots("A", ConnectionKind::Main)
            .is_none());
    }

    #[test]
    fn update_node_deep_merges_parameters() {
        let mut wf = empty_workflow();
        let mut n = node("n1", "Http", "n8n-nodes-base.httpRequest");
        n.parameters.insert("url".into(), "https://a".into());
        n.parameters
            .insert("options".into(), serde_json::json!({"timeout": 10}).as_object().unwrap().clone().into());
        wf.nodes.push(n);
        let mut patch = UpdateNodePatch::default();
        let mut new_params = Map::new();
        new_params.insert("method".into(), "POST".into());
        patch.parameters = Some(new_params);
        let ops = vec![DiffOperation::UpdateNode {
            name: "Http".into(),
            patch,
        }];
        let outcome = apply(&wf, &ops, ApplyMode::Atomic);
        assert!(outcome.committed);
        let n = outcome.workflow.node_by_name("Http").unwrap();
        assert_eq!(n.parameters.get("url").unwrap(), "https://a");
        assert_eq!(n.parameters.get("method").unwrap(), "POST");
    }

    #[test]
    fn update_node_rejects_duplicate_name_after_normalization() {
        let mut wf = empty_workflow();
        wf.nodes.push(node("n1", "Set Fields", "n8n-nodes-base.set"));
        wf.nodes.push(node("n2", "Http", "n8n-nodes-base.httpRequest"));
        let mut patch = UpdateNodePatch::default();
        patch.name = Some("Set   Fields".into());
        let ops = vec![DiffOperation::UpdateNode {
            name: "Http".into(),
            patch,
        }];
        let outcome = apply(&wf, &ops, ApplyMode::Atomic);
        assert!(!outcome.committed);
    }

    #[test]
    fn clean_stale_connections_drops_dangling_only() {
        let mut wf = empty_workflow();
        wf.nodes.push(node("n1", "A", "n8n-nodes-base.noOp"));
        let slots = wf.connections.slots_mut("A", ConnectionKind::Main);
        slots.push(vec![
            n8n_mcp_domain::workflow::ConnectionEndpoint {
                target_name: "Ghost".into(),
                kind: ConnectionKind::Main,
                target_index: 0,
            },
        ]);
        let ops = vec![DiffOperation::CleanStaleConnections];
        let outcome = apply(&wf, &ops, ApplyMode::Atomic);
        assert!(outcome.committed);
        assert!(outcome
            .workflow
            .connections
            .slots("A", ConnectionKind::Main)
            .is_none());
    }

    #[test]
    fn update_settings_strips_non_whitelisted_keys() {
        let wf = empty_workflow();
        let mut patch = Map::new();
        patch.insert("timezone".into(), "UTC".into());
        patch.insert("timeSavedPerExecution".into(), 42.into());
        let ops = vec![DiffOperation::UpdateSettings { patch }];
        let outcome = apply(&wf, &ops, ApplyMode::Atomic);
        assert!(outcome.committed);
        let settings = outcome.workflow.settings.unwrap();
        assert!(settings.contains_key("timezone"));
        assert!(!settings.contains_key("timeSavedPerExecution"));
    }

    #[test]
    fn rewire_connection_preserves_slot_index() {
        let mut wf = empty_workflow();
        wf.nodes.push(node("n1", "If", "n8n-nodes-base.if"));
        wf.nodes.push(node("n2", "A", "n8n-nodes-base.noOp"));
        wf.nodes.push(node("n3", "B", "n8n-nodes-base.noOp"));
        let slots = wf.connections.slots_mut("If", ConnectionKind::Main);
        slots.push(vec![]);
        slots.push(vec![n8n_mcp_domain::workflow::ConnectionEndpoint {
            target_name: "A".into(),
            kind: ConnectionKind::Main,
            target_index: 0,
        }]);
        let ops = vec![DiffOperation::RewireConnection {
            source: "If".into(),
            from: "A".into(),
            to: "B".into(),
            source_index: None,
            kind: ConnectionKind::Main,
        }];
        let outcome = apply(&wf, &ops, ApplyMode::Atomic);
        assert!(outcome.committed);
        let slots = outcome
            .workflow
            .connections
            .slots("If", ConnectionKind::Main)
            .unwrap();
        assert_eq!(slots.len(), 2);
        assert!(slots[0].is_empty());
        assert_eq!(slots[1][0].target_name, "B");
    }
}
