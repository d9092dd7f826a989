//! Workflow Validator (C2): a fixed-order, multi-pass static analyzer.
//!
//! Passes run in the order structure → per-node config → connections →
//! expressions → AI subgraph. Later passes may read earlier findings but
//! never mutate them — each pass function takes `&mut ValidationResult`
//! only to push new findings onto it.

mod ai_subgraph;
mod connections;
mod expressions;
mod node_config;
mod structure;

use n8n_mcp_catalog::Catalog;
use n8n_mcp_domain::validation::{Statistics, ValidationProfile, ValidationResult};
use n8n_mcp_domain::workflow::Workflow;

/// Runs every pass in order and returns the accumulated result.
///
/// Pass 1 gates the rest: a workflow that fails structural validation
/// (no nodes, no name, …) would make every later pass either panic or
/// produce noise, so passes 2-5 are skipped when pass 1 fails outright.
pub fn validate(workflow: &Workflow, catalog: &Catalog, profile: ValidationProfile) -> ValidationResult {
    let mut result = ValidationResult::new();
    result.statistics = compute_statistics(workflow);

    structure::run(workflow, &mut result);
    if !structure_is_fatal(&result) {
        node_config::run(workflow, catalog, &mut result, profile);
        connections::run(workflow, &mut result);
        expressions::run(workflow, &mut result, profile);
        ai_subgraph::run(workflow, catalog, &mut result);
    }

    if profile == ValidationProfile::Strict {
        promote_warnings_to_errors(&mut result);
    }
    result
}

fn structure_is_fatal(result: &ValidationResult) -> bool {
    use n8n_mcp_domain::validation::FindingCode::*;
    result.errors.iter().any(|f| {
        matches!(
            f.code,
            NoNodes | EmptyWorkflowName | InvalidSingleNodeWorkflow
        )
    })
}

fn promote_warnings_to_errors(result: &mut ValidationResult) {
    let warnings = std::mem::take(&mut result.warnings);
    for mut w in warnings {
        w.severity = n8n_mcp_domain::validation::Severity::Error;
        result.errors.push(w);
    }
    if !result.errors.is_empty() {
        result.valid = false;
    }
}

fn compute_statistics(workflow: &Workflow) -> Statistics {
    let total_nodes = workflow.nodes.len();
    let enabled_nodes = workflow.nodes.iter().filter(|n| n.enabled()).count();
    let trigger_nodes = workflow
        .nodes
        .iter()
        .filter(|n| is_trigger_type(&n.node_type))
        .count();
    Statistics {
        total_nodes,
        enabled_nodes,
        trigger_nodes,
        valid_connections: 0,
        invalid_connections: 0,
        expressions_validated: 0,
    }
}

fn is_trigger_type(node_type: &str) -> bool {
    let canonical = n8n_mcp_normalize::normalize_type(node_type);
    canonical.to_ascii_lowercase().contains("trigger")
}

#[cfg(test)]
mod tests {
    use super::*;
    use n8n_mcp_domain::workflow::{Connections, Node};
    use serde_json::Map;

    fn node(name: &str, node_type: &str) -> Node {
        Node {
            id: format!("id-{name}"),
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

    fn workflow(nodes: Vec<Node>) -> Workflow {
        Workflow {
            id: Some("wf1".into()),
            name: "Test".into(),
            nodes,
            connections: Connections::new(),
            settings: None,
            active: None,
            tags: vec![],
            created_at: None,
            updated_at: None,
            version_id: None,
        }
    }

    #[test]
    fn single_webhook_node_is_valid() {
        let wf = workflow(vec![node("Webhook", "webhook")]);
        let result = validate(&wf, n8n_mcp_catalog::embedded(), ValidationProfile::AiFriendly);
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn single_non_trigger_node_is_invalid() {
        let wf = workflow(vec![node("Http", "httpRequest")]);
        let result = validate(&wf, n8n_mcp_catalog::embedded(), ValidationProfile::AiFriendly);
        assert!(!result.valid);
    }

    #[test]
    fn empty_workflow_fails_pass_one_only() {
        let wf = workflow(vec![]);
        let result = validate(&wf, n8n_mcp_catalog::embedded(), ValidationProfile::AiFriendly);
        assert!(!result.valid);
        assert_eq!(result.statistics.total_nodes, 0);
    }

    #[test]
    fn strict_profile_promotes_warnings_to_errors() {
        // A node set while hidden under ai-friendly is a warning; under
        // strict it must fail validation.
        let mut http = node("Http", "httpRequest");
        http.parameters.insert("timeout".into(), serde_json::json!(-5));
        let mut trigger = node("Start", "manualTrigger");
        trigger.position = (0.0, 0.0);
        let wf = workflow(vec![trigger, http]);
        let strict = validate(&wf, n8n_mcp_catalog::embedded(), ValidationProfile::Strict);
        let lenient = validate(&wf, n8n_mcp_catalog::embedded(), ValidationProfile::AiFriendly);
        assert!(!strict.valid);
        // Under ai-friendly the same numeric-range violation is still an
        // error (range checks are errors in every profile), so both are
        // invalid here; the point of this test is that strict never has
        // *fewer* errors than a lenient profile.
        assert!(strict.errors.len() >= lenient.errors.len());
    }
}
