//! Pass 4 — expressions (§4.3). Thin wrapper over C4; only runs at all
//! for the `runtime`, `ai-friendly`, and `strict` profiles — `minimal`
//! checks required fields only.

use n8n_mcp_domain::validation::{Confidence as DomainConfidence, Finding, FindingCode, ValidationProfile, ValidationResult};
use n8n_mcp_domain::workflow::Workflow;
use n8n_mcp_exprfmt::{scan_parameters_full, ExpressionClass};

pub fn run(workflow: &Workflow, result: &mut ValidationResult, profile: ValidationProfile) {
    if profile == ValidationProfile::Minimal {
        return;
    }

    let mut validated = 0usize;
    for node in &workflow.nodes {
        if !node.enabled() {
            continue;
        }
        let params = serde_json::Value::Object(node.parameters.clone());
        let issues = scan_parameters_full(&params);
        for issue in issues {
            validated += 1;
            let code = match issue.class {
                ExpressionClass::Correct => continue,
                ExpressionClass::MissingEqualsPrefix => FindingCode::ExpressionMissingEqualsPrefix,
                ExpressionClass::SuperfluousEqualsPrefix => FindingCode::ExpressionSuperfluousEqualsPrefix,
                ExpressionClass::Malformed => FindingCode::ExpressionMalformed,
            };
            let severity_is_warning = matches!(issue.class, ExpressionClass::SuperfluousEqualsPrefix)
                && profile == ValidationProfile::AiFriendly;

            let mut finding = if severity_is_warning {
                Finding::warning(code, describe(&issue.path, issue.class))
            } else {
                Finding::error(code, describe(&issue.path, issue.class))
            };
            finding = finding.with_node(node.name.clone());
            if let Some(fix) = &issue.suggested_fix {
                finding = finding.with_details(serde_json::json!({
                    "path": issue.path,
                    "suggestedFix": fix,
                    "confidence": confidence_str(issue.confidence),
                }));
            }
            result.push(finding);
        }
    }
    result.statistics.expressions_validated = validated;
}

fn describe(path: &str, class: ExpressionClass) -> String {
    match class {
        ExpressionClass::Correct => format!("{path} is a correctly formatted expression"),
        ExpressionClass::MissingEqualsPrefix => {
            format!("{path} contains a template expression but is missing the leading \"=\"")
        }
        ExpressionClass::SuperfluousEqualsPrefix => {
            format!("{path} has a leading \"=\" but contains no template expression")
        }
        ExpressionClass::Malformed => format!("{path} has unbalanced {{{{ }}}} delimiters"),
    }
}

fn confidence_str(c: DomainConfidence) -> &'static str {
    match c {
        DomainConfidence::High => "high",
        DomainConfidence::Medium => "medium",
        DomainConfidence::Low => "low",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use n8n_mcp_domain::workflow::{Connections, Node};
    use serde_json::{json, Map};

    fn node_with(params: Map<String, serde_json::Value>) -> Node {
        Node {
            id: "n1".into(),
            name: "Http".into(),
            node_type: "httpRequest".into(),
            type_version: 1.0,
            position: (0.0, 0.0),
            parameters: params,
            credentials: None,
            disabled: false,
            notes: None,
            on_error: None,
        }
    }

    fn workflow(node: Node) -> Workflow {
        Workflow {
            id: None,
            name: "T".into(),
            nodes: vec![node],
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
    fn missing_equals_prefix_is_flagged() {
        let mut params = Map::new();
        params.insert("url".into(), json!("{{ $json.url }}"));
        let wf = workflow(node_with(params));
        let mut result = ValidationResult::new();
        run(&wf, &mut result, ValidationProfile::Runtime);
        assert!(result
            .errors
            .iter()
            .any(|f| f.code == FindingCode::ExpressionMissingEqualsPrefix));
    }

    #[test]
    fn minimal_profile_skips_expression_checks() {
        let mut params = Map::new();
        params.insert("url".into(), json!("{{ $json.url }}"));
        let wf = workflow(node_with(params));
        let mut result = ValidationResult::new();
        run(&wf, &mut result, ValidationProfile::Minimal);
        assert!(result.errors.is_empty());
        assert_eq!(result.statistics.expressions_validated, 0);
    }

    #[test]
    fn ai_friendly_downgrades_superfluous_prefix_to_warning() {
        let mut params = Map::new();
        params.insert("name".into(), json!("=plain text"));
        let wf = workflow(node_with(params));
        let mut result = ValidationResult::new();
        run(&wf, &mut result, ValidationProfile::AiFriendly);
        assert!(result
            .warnings
            .iter()
            .any(|f| f.code == FindingCode::ExpressionSuperfluousEqualsPrefix));
        assert!(result.valid);
    }
}
