//! Pass 3 — connections (§4.3, Testable Property 1).

use n8n_mcp_domain::validation::{Finding, FindingCode, ValidationResult};
use n8n_mcp_domain::workflow::Workflow;
use n8n_mcp_normalize::normalize_name;

pub fn run(workflow: &Workflow, result: &mut ValidationResult) {
    let names: std::collections::HashSet<String> = workflow
        .nodes
        .iter()
        .map(|n| normalize_name(&n.name))
        .collect();
    let ids: std::collections::HashMap<&str, &str> = workflow
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.name.as_str()))
        .collect();

    let mut valid_connections = 0usize;
    let mut invalid_connections = 0usize;

    for (source, kind, _slot_index, endpoint) in workflow.connections.iter_endpoints() {
        let source_norm = normalize_name(source);
        if !names.contains(&source_norm) {
            invalid_connections += 1;
            result.push(endpoint_not_found_finding(source, &ids));
            continue;
        }

        let target_norm = normalize_name(&endpoint.target_name);
        if !names.contains(&target_norm) {
            invalid_connections += 1;
            if let Some(&correct_name) = ids.get(endpoint.target_name.as_str()) {
                result.push(
                    Finding::error(
                        FindingCode::EndpointUsesIdNotName,
                        format!(
                            "connection from {source:?} targets {:?}, which looks like a node id; use the name {correct_name:?} instead",
                            endpoint.target_name
                        ),
                    )
                    .with_node(source.to_string()),
                );
            } else {
                result.push(
                    Finding::error(
                        FindingCode::EndpointNodeNotFound,
                        format!(
                            "connection from {source:?} targets unknown node {:?}",
                            endpoint.target_name
                        ),
                    )
                    .with_node(source.to_string()),
                );
            }
            continue;
        }

        let _ = kind;
        valid_connections += 1;
    }

    result.statistics.valid_connections = valid_connections;
    result.statistics.invalid_connections = invalid_connections;
}

fn endpoint_not_found_finding(source: &str, ids: &std::collections::HashMap<&str, &str>) -> Finding {
    if let Some(&correct_name) = ids.get(source) {
        Finding::error(
            FindingCode::EndpointUsesIdNotName,
            format!("connection source {source:?} looks like a node id; use the name {correct_name:?} instead"),
        )
    } else {
        Finding::error(
            FindingCode::EndpointNodeNotFound,
            format!("connection source {source:?} does not match any node in the workflow"),
        )
    }
}
