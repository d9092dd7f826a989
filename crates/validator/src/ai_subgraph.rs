//! Pass 5 — AI subgraph (§4.3). Only meaningful after node-type
//! normalization: every type comparison in this module goes through
//! [`n8n_mcp_normalize::normalize_type`].
//!
//! Connections of the non-`main` kinds point from the satellite node to
//! the agent/chain it serves — the reverse of data flow. "Incoming"
//! below always means "this node is the connection's *target*".

use n8n_mcp_catalog::Catalog;
use n8n_mcp_domain::validation::{Finding, FindingCode, ValidationResult};
use n8n_mcp_domain::workflow::{ConnectionKind, Node, Workflow};
use n8n_mcp_normalize::normalize_type;

pub fn run(workflow: &Workflow, catalog: &Catalog, result: &mut ValidationResult) {
    for node in &workflow.nodes {
        if !node.enabled() {
            continue;
        }
        match normalize_type(&node.node_type).as_str() {
            "agent" => check_agent(workflow, node, result),
            "chainLlm" => check_basic_chain(workflow, node, result),
            _ => {}
        }
    }

    check_streaming_chat_triggers(workflow, result);
    check_tool_subnodes(workflow, catalog, result);
}

fn incoming_count(workflow: &Workflow, target: &str, kind: ConnectionKind) -> usize {
    workflow
        .connections
        .iter_endpoints()
        .filter(|(_, k, _, e)| *k == kind && e.target_name == target)
        .count()
}

fn incoming_sources(workflow: &Workflow, target: &str, kind: ConnectionKind) -> Vec<String> {
    workflow
        .connections
        .iter_endpoints()
        .filter(|(_, k, _, e)| *k == kind && e.target_name == target)
        .map(|(source, ..)| source.to_string())
        .collect()
}

fn has_outgoing_main(workflow: &Workflow, source: &str) -> bool {
    workflow
        .connections
        .slots(source, ConnectionKind::Main)
        .is_some_and(|slots| slots.iter().any(|slot| !slot.is_empty()))
}

fn streams(node: &Node) -> bool {
    if node
        .parameters
        .get("streamResponse")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
    {
        return true;
    }
    node.parameters
        .get("options")
        .and_then(|o| o.get("streamResponse"))
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

fn check_agent(workflow: &Workflow, node: &Node, result: &mut ValidationResult) {
    let lm_count = incoming_count(workflow, &node.name, ConnectionKind::AiLanguageModel);
    let memory_count = incoming_count(workflow, &node.name, ConnectionKind::AiMemory);

    if lm_count == 0 {
        result.push(
            Finding::error(
                FindingCode::MissingLanguageModel,
                "agent has no language-model input",
            )
            .with_node(node.name.clone()),
        );
    } else if lm_count > 2 {
        result.push(
            Finding::error(
                FindingCode::TooManyLanguageModels,
                format!("agent has {lm_count} language-model inputs; at most 2 are allowed (the second is a fallback)"),
            )
            .with_node(node.name.clone()),
        );
    }

    if memory_count > 1 {
        result.push(
            Finding::error(
                FindingCode::TooManyMemoryInputs,
                format!("agent has {memory_count} memory inputs; at most 1 is allowed"),
            )
            .with_node(node.name.clone()),
        );
    }

    if streams(node) && has_outgoing_main(workflow, &node.name) {
        result.push(
            Finding::error(
                FindingCode::StreamingWithMainOutput,
                "agent has options.streamResponse enabled but also has a main output connection; \
                 streaming agents must have no main outputs",
            )
            .with_node(node.name.clone()),
        );
    }
}

fn check_basic_chain(workflow: &Workflow, node: &Node, result: &mut ValidationResult) {
    let lm_count = incoming_count(workflow, &node.name, ConnectionKind::AiLanguageModel);
    let tool_count = incoming_count(workflow, &node.name, ConnectionKind::AiTool);
    let memory_count = incoming_count(workflow, &node.name, ConnectionKind::AiMemory);

    if lm_count != 1 {
        result.push(
            Finding::error(
                FindingCode::MissingLanguageModel,
                format!("basic LLM chain requires exactly 1 language-model input, found {lm_count}"),
            )
            .with_node(node.name.clone()),
        );
    }
    if tool_count > 0 {
        result.push(
            Finding::error(
                FindingCode::BasicChainWrongWiring,
                "basic LLM chain does not accept tool inputs; use an agent node for tool-calling",
            )
            .with_node(node.name.clone()),
        );
    }
    if memory_count > 1 {
        result.push(
            Finding::error(
                FindingCode::TooManyMemoryInputs,
                format!("basic LLM chain has {memory_count} memory inputs; at most 1 is allowed"),
            )
            .with_node(node.name.clone()),
        );
    }
}

fn check_streaming_chat_triggers(workflow: &Workflow, result: &mut ValidationResult) {
    for node in &workflow.nodes {
        if normalize_type(&node.node_type) != "chatTrigger" {
            continue;
        }
        let response_mode = node.parameters.get("responseMode").and_then(|v| v.as_str());
        if response_mode != Some("streaming") {
            continue;
        }
        let Some(slots) = workflow.connections.slots(&node.name, ConnectionKind::Main) else {
            continue;
        };
        for slot in slots {
            for endpoint in slot {
                let Some(target) = workflow.node_by_name(&endpoint.target_name) else {
                    continue;
                };
                if normalize_type(&target.node_type) != "agent" {
                    result.push(
                        Finding::error(
                            FindingCode::StreamingWrongTarget,
                            format!(
                                "chat trigger in streaming mode targets {:?}, which is not an agent",
                                target.name
                            ),
                        )
                        .with_node(node.name.clone()),
                    );
                } else if has_outgoing_main(workflow, &target.name) {
                    result.push(
                        Finding::error(
                            FindingCode::StreamingWithMainOutput,
                            format!(
                                "chat trigger in streaming mode targets agent {:?}, which has a main output connection; \
                                 streaming agents must have no main outputs",
                                target.name
                            ),
                        )
                        .with_node(target.name.clone()),
                    );
                }
            }
        }
    }
}

fn check_tool_subnodes(workflow: &Workflow, catalog: &Catalog, result: &mut ValidationResult) {
    let tool_source_names: std::collections::HashSet<String> = workflow
        .connections
        .iter_endpoints()
        .filter(|(_, k, ..)| *k == ConnectionKind::AiTool)
        .map(|(source, ..)| source.to_string())
        .collect();

    for node in &workflow.nodes {
        if !tool_source_names.contains(&node.name) {
            continue;
        }
        let canonical = normalize_type(&node.node_type);
        match canonical.as_str() {
            "toolHttpRequest" => {
                require_param(node, "toolDescription", result);
                require_param(node, "url", result);
                check_credential_if_authenticated(node, result);
            }
            "toolCode" => {
                require_param(node, "toolDescription", result);
                require_param(node, "code", result);
            }
            "toolVectorStore" => {
                require_param(node, "toolDescription", result);
            }
            "toolWorkflow" => {
                require_param(node, "toolDescription", result);
                require_param(node, "workflowId", result);
            }
            "toolCalculator" => {}
            other => {
                if catalog.lookup(other).is_none() {
                    result.push(
                        Finding::warning(
                            FindingCode::UnknownAiToolType,
                            format!("{other:?} is wired as an AI tool but has no known tool dispatcher"),
                        )
                        .with_node(node.name.clone()),
                    );
                }
            }
        }
    }
}

fn require_param(node: &Node, name: &str, result: &mut ValidationResult) {
    let present = node
        .parameters
        .get(name)
        .is_some_and(|v| !v.is_null() && v.as_str() != Some(""));
    if !present {
        result.push(
            Finding::error(
                FindingCode::MissingToolParameter,
                format!("AI tool node is missing required parameter {name:?}"),
            )
            .with_node(node.name.clone()),
        );
    }
}

fn check_credential_if_authenticated(node: &Node, result: &mut ValidationResult) {
    let needs_credential = node
        .parameters
        .get("authentication")
        .is_some_and(|v| v.as_str().map(|s| s != "none").unwrap_or(true));
    if needs_credential && node.credentials.is_none() {
        result.push(
            Finding::warning(
                FindingCode::MissingToolCredential,
                "tool node requires authentication but declares no credentials",
            )
            .with_node(node.name.clone()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use n8n_mcp_domain::workflow::{ConnectionEndpoint, Connections, Node};
    use serde_json::{json, Map};

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

    fn connect(conns: &mut Connections, source: &str, target: &str, kind: ConnectionKind) {
        conns.slots_mut(source, kind).push(vec![ConnectionEndpoint {
            target_name: target.into(),
            kind,
            target_index: 0,
        }]);
    }

    fn workflow(nodes: Vec<Node>, connections: Connections) -> Workflow {
        Workflow {
            id: None,
            name: "T".into(),
            nodes,
            connections,
            settings: None,
            active: None,
            tags: vec![],
            created_at: None,
            updated_at: None,
            version_id: None,
        }
    }

    #[test]
    fn agent_with_no_language_model_is_an_error() {
        let wf = workflow(vec![node("Agent", "agent")], Connections::new());
        let mut result = ValidationResult::new();
        run(&wf, n8n_mcp_catalog::embedded(), &mut result);
        assert!(result
            .errors
            .iter()
            .any(|f| f.code == FindingCode::MissingLanguageModel));
    }

    #[test]
    fn agent_with_two_language_models_is_fine_three_is_not() {
        let mut conns = Connections::new();
        connect(&mut conns, "Lm1", "Agent", ConnectionKind::AiLanguageModel);
        connect(&mut conns, "Lm2", "Agent", ConnectionKind::AiLanguageModel);
        let wf = workflow(
            vec![node("Agent", "agent"), node("Lm1", "lmChatOpenAi"), node("Lm2", "lmChatOpenAi")],
            conns,
        );
        let mut result = ValidationResult::new();
        run(&wf, n8n_mcp_catalog::embedded(), &mut result);
        assert!(!result
            .errors
            .iter()
            .any(|f| f.code == FindingCode::TooManyLanguageModels));

        let mut conns3 = Connections::new();
        connect(&mut conns3, "Lm1", "Agent", ConnectionKind::AiLanguageModel);
        connect(&mut conns3, "Lm2", "Agent", ConnectionKind::AiLanguageModel);
        connect(&mut conns3, "Lm3", "Agent", ConnectionKind::AiLanguageModel);
        let wf3 = workflow(
            vec![
                node("Agent", "agent"),
                node("Lm1", "lmChatOpenAi"),
                node("Lm2", "lmChatOpenAi"),
                node("Lm3", "lmChatOpenAi"),
            ],
            conns3,
        );
        let mut result3 = ValidationResult::new();
        run(&wf3, n8n_mcp_catalog::embedded(), &mut result3);
        assert!(result3
            .errors
            .iter()
            .any(|f| f.code == FindingCode::TooManyLanguageModels));
    }

    #[test]
    fn streaming_agent_with_main_output_is_rejected() {
        let mut conns = Connections::new();
        connect(&mut conns, "Lm1", "Agent", ConnectionKind::AiLanguageModel);
        connect(&mut conns, "Agent", "Next", ConnectionKind::Main);
        let mut agent = node("Agent", "agent");
        agent.parameters.insert("streamResponse".into(), json!(true));
        let wf = workflow(
            vec![agent, node("Lm1", "lmChatOpenAi"), node("Next", "httpRequest")],
            conns,
        );
        let mut result = ValidationResult::new();
        run(&wf, n8n_mcp_catalog::embedded(), &mut result);
        assert!(result
            .errors
            .iter()
            .any(|f| f.code == FindingCode::StreamingWithMainOutput));
    }

    #[test]
    fn streaming_chat_trigger_into_agent_with_main_output_is_rejected() {
        let mut conns = Connections::new();
        connect(&mut conns, "Lm1", "Agent", ConnectionKind::AiLanguageModel);
        connect(&mut conns, "Trigger", "Agent", ConnectionKind::Main);
        connect(&mut conns, "Agent", "SetNode", ConnectionKind::Main);
        let mut trigger = node("Trigger", "chatTrigger");
        trigger.parameters.insert("responseMode".into(), json!("streaming"));
        let wf = workflow(
            vec![trigger, node("Agent", "agent"), node("Lm1", "lmChatOpenAi"), node("SetNode", "set")],
            conns,
        );
        let mut result = ValidationResult::new();
        run(&wf, n8n_mcp_catalog::embedded(), &mut result);
        assert!(result
            .errors
            .iter()
            .any(|f| f.code == FindingCode::StreamingWithMainOutput));
    }

    #[test]
    fn tool_http_request_missing_description_is_flagged() {
        let mut conns = Connections::new();
        connect(&mut conns, "Lm1", "Agent", ConnectionKind::AiLanguageModel);
        connect(&mut conns, "HttpTool", "Agent", ConnectionKind::AiTool);
        let mut tool = node("HttpTool", "toolHttpRequest");
        tool.parameters.insert("url".into(), json!("https://example.com"));
        let wf = workflow(
            vec![node("Agent", "agent"), node("Lm1", "lmChatOpenAi"), tool],
            conns,
        );
        let mut result = ValidationResult::new();
        run(&wf, n8n_mcp_catalog::embedded(), &mut result);
        assert!(result
            .errors
            .iter()
            .any(|f| f.code == FindingCode::MissingToolParameter));
    }

    #[test]
    fn basic_chain_rejects_tool_inputs() {
        let mut conns = Connections::new();
        connect(&mut conns, "Lm1", "Chain", ConnectionKind::AiLanguageModel);
        connect(&mut conns, "Tool", "Chain", ConnectionKind::AiTool);
        let wf = workflow(
            vec![
                node("Chain", "chainLlm"),
                node("Lm1", "lmChatOpenAi"),
                node("Tool", "toolCalculator"),
            ],
            conns,
        );
        let mut result = ValidationResult::new();
        run(&wf, n8n_mcp_catalog::embedded(), &mut result);
        assert!(result
            .errors
            .iter()
            .any(|f| f.code == FindingCode::BasicChainWrongWiring));
    }
}
