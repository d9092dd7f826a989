//! Pass 2 — per-node config (§4.3).

use n8n_mcp_catalog::{Catalog, PropertyType};
use n8n_mcp_domain::validation::{Confidence, Finding, FindingCode, ValidationProfile, ValidationResult};
use n8n_mcp_domain::workflow::{Node, Workflow};
use serde_json::Value;

pub fn run(workflow: &Workflow, catalog: &Catalog, result: &mut ValidationResult, profile: ValidationProfile) {
    for node in &workflow.nodes {
        if !node.enabled() {
            continue;
        }
        let Some(schema) = catalog.lookup(&node.node_type) else {
            continue;
        };

        let supplied: std::collections::HashMap<String, Value> = node
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let resolved = schema.resolve_config(&supplied);

        for prop in &schema.properties {
            let active = prop.is_active(&resolved);
            let supplied_value = node.parameters.get(prop.name);

            if !active {
                if supplied_value.is_some() && profile != ValidationProfile::Minimal {
                    result.push(
                        Finding::warning(
                            FindingCode::PropertySetWhileHidden,
                            format!(
                                "{:?} is set but currently hidden by displayOptions; the value has no effect",
                                prop.name
                            ),
                        )
                        .with_node(node.name.clone()),
                    );
                }
                continue;
            }

            match supplied_value {
                None => {
                    if prop.required {
                        result.push(
                            Finding::error(
                                FindingCode::MissingRequiredProperty,
                                format!("missing required property {:?}", prop.name),
                            )
                            .with_node(node.name.clone()),
                        );
                    }
                }
                Some(value) => check_value(node, prop, value, result),
            }
        }
    }
}

fn check_value(
    node: &Node,
    prop: &n8n_mcp_catalog::PropertySchema,
    value: &Value,
    result: &mut ValidationResult,
) {
    match prop.prop_type {
        PropertyType::Options => {
            if let (Some(options), Value::String(s)) = (&prop.options, value) {
                if !options.contains(&s.as_str()) {
                    result.push(
                        Finding::error(
                            FindingCode::InvalidOptionValue,
                            format!(
                                "{:?} = {s:?} is not one of the allowed values {options:?}",
                                prop.name
                            ),
                        )
                        .with_node(node.name.clone()),
                    );
                }
            }
        }
        PropertyType::Number => {
            let Some(n) = value.as_f64() else {
                result.push(type_mismatch(node, prop.name, "number"));
                return;
            };
            if let Some((min, max)) = prop.numeric_range {
                if n < min || n > max {
                    result.push(
                        Finding::error(
                            FindingCode::NumericOutOfRange,
                            format!("{:?} = {n} is outside the allowed range [{min}, {max}]", prop.name),
                        )
                        .with_node(node.name.clone()),
                    );
                }
            }
        }
        PropertyType::Boolean => {
            if !value.is_boolean() {
                result.push(type_mismatch(node, prop.name, "boolean"));
            }
        }
        PropertyType::String => {
            if !value.is_string() {
                result.push(type_mismatch(node, prop.name, "string"));
            }
        }
        PropertyType::Array => {
            if !value.is_array() {
                result.push(type_mismatch(node, prop.name, "array"));
            }
        }
        PropertyType::Object => {
            if !value.is_object() {
                result.push(type_mismatch(node, prop.name, "object"));
            }
        }
        PropertyType::ResourceLocator => check_resource_locator(node, prop, value, result),
    }
}

fn type_mismatch(node: &Node, prop_name: &str, expected: &str) -> Finding {
    Finding::error(
        FindingCode::TypeMismatch,
        format!("{prop_name:?} must be a {expected}"),
    )
    .with_node(node.name.clone())
}

fn check_resource_locator(
    node: &Node,
    prop: &n8n_mcp_catalog::PropertySchema,
    value: &Value,
    result: &mut ValidationResult,
) {
    let Value::Object(obj) = value else {
        result.push(
            Finding::error(
                FindingCode::InvalidResourceLocator,
                format!(
                    "{:?} must be an object like {{ \"mode\": \"list\"/\"id\", \"value\": … }}, not a bare string",
                    prop.name
                ),
            )
            .with_node(node.name.clone())
            .with_details(serde_json::json!({ "confidence": confidence_label(Confidence::High) })),
        );
        return;
    };

    let mode = obj.get("mode").and_then(|m| m.as_str());
    let has_value = obj.contains_key("value");

    if mode.is_none() || !has_value {
        result.push(
            Finding::error(
                FindingCode::InvalidResourceLocator,
                format!(
                    "{:?} must have both \"mode\" and \"value\" members",
                    prop.name
                ),
            )
            .with_node(node.name.clone()),
        );
        return;
    }

    if let (Some(modes), Some(mode)) = (&prop.resource_locator_modes, mode) {
        if !modes.contains(&mode) {
            result.push(
                Finding::error(
                    FindingCode::InvalidResourceLocator,
                    format!("{:?}.mode = {mode:?} is not one of {modes:?}", prop.name),
                )
                .with_node(node.name.clone()),
            );
        }
    }
}

fn confidence_label(c: Confidence) -> &'static str {
    match c {
        Confidence::High => "high",
        Confidence::Medium => "medium",
        Confidence::Low => "low",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use n8n_mcp_domain::workflow::Connections;
    use serde_json::{json, Map};

    fn node(name: &str, node_type: &str, params: Map<String, Value>) -> Node {
        Node {
            id: "id1".into(),
            name: name.into(),
            node_type: node_type.into(),
            type_version: 1.0,
            position: (0.0, 0.0),
            parameters: params,
            credentials: None,
            disabled: false,
            notes: None,
            on_error: None,
        }
    }

    fn workflow(nodes: Vec<Node>) -> Workflow {
        Workflow {
            id: None,
            name: "T".into(),
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
    fn missing_required_property_is_an_error() {
        let wf = workflow(vec![node("Webhook", "webhook", Map::new())]);
        let mut result = ValidationResult::new();
        run(&wf, n8n_mcp_catalog::embedded(), &mut result, ValidationProfile::AiFriendly);
        assert!(result
            .errors
            .iter()
            .any(|f| f.code == FindingCode::MissingRequiredProperty));
    }

    #[test]
    fn bare_string_resource_locator_is_hard_error() {
        let mut params = Map::new();
        params.insert("url".into(), json!("https://example.com"));
        params.insert("authentication".into(), json!("predefinedCredentialType"));
        let wf = workflow(vec![node("Http", "httpRequest", params)]);
        let mut result = ValidationResult::new();
        run(&wf, n8n_mcp_catalog::embedded(), &mut result, ValidationProfile::AiFriendly);
        assert!(result
            .errors
            .iter()
            .any(|f| f.code == FindingCode::InvalidResourceLocator));
    }

    #[test]
    fn well_formed_resource_locator_passes() {
        let mut params = Map::new();
        params.insert("url".into(), json!("https://example.com"));
        params.insert(
            "authentication".into(),
            json!({ "mode": "list", "value": "abc" }),
        );
        let wf = workflow(vec![node("Http", "httpRequest", params)]);
        let mut result = ValidationResult::new();
        run(&wf, n8n_mcp_catalog::embedded(), &mut result, ValidationProfile::AiFriendly);
        assert!(!result
            .errors
            .iter()
            .any(|f| f.code == FindingCode::InvalidResourceLocator));
    }

    #[test]
    fn hidden_property_set_is_a_warning_not_an_error() {
        let mut params = Map::new();
        params.insert("promptType".into(), json!("auto"));
        params.insert("text".into(), json!("hello")); // hidden: only shown when promptType == define
        let wf = workflow(vec![node("Agent", "agent", params)]);
        let mut result = ValidationResult::new();
        run(&wf, n8n_mcp_catalog::embedded(), &mut result, ValidationProfile::AiFriendly);
        assert!(result
            .warnings
            .iter()
            .any(|f| f.code == FindingCode::PropertySetWhileHidden));
        assert!(result.valid);
    }

    #[test]
    fn numeric_out_of_range_is_an_error() {
        let mut params = Map::new();
        params.insert("url".into(), json!("https://example.com"));
        params.insert("timeout".into(), json!(-1));
        let wf = workflow(vec![node("Http", "httpRequest", params)]);
        let mut result = ValidationResult::new();
        run(&wf, n8n_mcp_catalog::embedded(), &mut result, ValidationProfile::AiFriendly);
        assert!(result
            .errors
            .iter()
            .any(|f| f.code == FindingCode::NumericOutOfRange));
    }
}
