//! Pass 1 — structure (§4.3).

use n8n_mcp_domain::validation::{Finding, FindingCode, ValidationResult};
use n8n_mcp_domain::workflow::Workflow;

const KNOWN_PREFIXES: &[&str] = &[
    "n8n-nodes-base.",
    "n8n-nodes-langchain.",
    "@n8n/n8n-nodes-langchain.",
];

pub fn run(workflow: &Workflow, result: &mut ValidationResult) {
    if workflow.name.trim().is_empty() {
        result.push(Finding::error(
            FindingCode::EmptyWorkflowName,
            "workflow name must not be empty",
        ));
    }

    if workflow.nodes.is_empty() {
        result.push(Finding::error(FindingCode::NoNodes, "workflow has no nodes"));
        return;
    }

    if workflow.nodes.len() == 1 {
        let only = &workflow.nodes[0];
        let canonical = n8n_mcp_normalize::normalize_type(&only.node_type);
        if !is_trigger_like(&canonical) {
            result.push(
                Finding::error(
                    FindingCode::InvalidSingleNodeWorkflow,
                    "a single-node workflow is only valid if that node is a trigger (e.g. a webhook)",
                )
                .with_node(only.name.clone()),
            );
        }
    }

    for node in &workflow.nodes {
        check_type_prefix(node, result);
    }

    if workflow.nodes.len() > 1 && workflow.connections.0.is_empty() {
        result.push(Finding::error(
            FindingCode::EmptyConnectionsMultiNode,
            "a multi-node workflow has no connections at all; example: \
             connections: { \"NodeA\": { \"main\": [[{ \"node\": \"NodeB\", \"type\": \"main\", \"index\": 0 }]] } }",
        ));
    }
}

fn is_trigger_like(canonical_type: &str) -> bool {
    canonical_type.to_ascii_lowercase().contains("trigger")
}

fn check_type_prefix(node: &n8n_mcp_domain::workflow::Node, result: &mut ValidationResult) {
    let t = &node.node_type;
    if t.contains('.') {
        let has_known_prefix = KNOWN_PREFIXES.iter().any(|p| t.starts_with(p));
        if !has_known_prefix {
            let canonical = n8n_mcp_normalize::normalize_type(t);
            result.push(
                Finding::error(
                    FindingCode::InvalidTypePrefix,
                    format!(
                        "node type {t:?} has an unrecognized vendor prefix; did you mean \
                         \"n8n-nodes-base.{canonical}\"?"
                    ),
                )
                .with_node(node.name.clone()),
            );
        }
    } else if !t.is_empty() {
        // No prefix at all is acceptable: it's the short form the catalog
        // stores natively. Only penalize a clearly-malformed empty type.
    }
    if t.trim().is_empty() {
        result.push(
            Finding::error(FindingCode::MissingRequiredField, "node is missing a type")
                .with_node(node.name.clone()),
        );
    }
}
