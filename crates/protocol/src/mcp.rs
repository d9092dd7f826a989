//! MCP-level framing around the tool dispatch layer: `initialize`,
//! `tools/list`, and `tools/call`, independent of transport.

use crate::rpc::{JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND};
use crate::state::AppState;
use crate::tools;
use n8n_mcp_domain::instance::InstanceContext;
use serde_json::Value;

const PROTOCOL_VERSION: &str = "2024-11-05";

fn tool_defs() -> Vec<Value> {
    let tools: &[(&str, &str)] = &[
        ("n8n_create_workflow", "Create a new workflow."),
        ("n8n_update_full_workflow", "Replace a workflow's nodes/connections/settings wholesale."),
        ("n8n_update_partial_workflow", "Apply a batch of graph diff operations to a workflow."),
        ("n8n_get_workflow", "Fetch a workflow by id."),
        ("n8n_get_workflow_details", "Fetch a workflow by id with full detail."),
        ("n8n_get_workflow_structure", "Fetch only a workflow's node names and connection graph."),
        ("n8n_get_workflow_minimal", "Fetch only a workflow's id, name and active flag."),
        ("n8n_list_workflows", "Page through workflows."),
        ("n8n_delete_workflow", "Delete a workflow by id."),
        ("n8n_validate_workflow", "Run static validation against a workflow."),
        ("n8n_autofix_workflow", "Preview or commit confidence-ranked fixes for a workflow."),
        ("n8n_trigger_webhook_workflow", "Invoke a workflow's webhook URL."),
        ("n8n_list_executions", "List workflow executions."),
        ("n8n_get_execution", "Fetch a single execution by id."),
        ("n8n_delete_execution", "Delete an execution by id."),
        ("n8n_health_check", "Check host API reachability."),
        ("n8n_diagnostic", "Report cache and catalog diagnostics without calling the host."),
    ];
    tools
        .iter()
        .map(|(name, description)| {
            serde_json::json!({
                "name": name,
                "description": description,
                "inputSchema": { "type": "object", "properties": {} },
            })
        })
        .collect()
}

/// Handles one parsed JSON-RPC request and produces the response to
/// write back, or `None` for a notification (no `id`).
pub async fn handle_request(state: &AppState, ctx: &InstanceContext, req: JsonRpcRequest) -> Option<JsonRpcResponse> {
    let id = req.id.clone();
    let Some(id) = id else {
        // Notification: no response expected.
        tracing::debug!(method = %req.method, "received notification");
        return None;
    };

    let response = match req.method.as_str() {
        "initialize" => JsonRpcResponse::success(
            id,
            serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "n8n-mcp-gateway", "version": env!("CARGO_PKG_VERSION") },
            }),
        ),
        "tools/list" => JsonRpcResponse::success(id, serde_json::json!({ "tools": tool_defs() })),
        "tools/call" => handle_tool_call(state, ctx, id, req.params).await,
        other => JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("unknown method: {other}")),
    };
    Some(response)
}

async fn handle_tool_call(state: &AppState, ctx: &InstanceContext, id: Value, params: Option<Value>) -> JsonRpcResponse {
    let Some(params) = params else {
        return JsonRpcResponse::failure(id, INVALID_PARAMS, "tools/call requires params");
    };
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::failure(id, INVALID_PARAMS, "tools/call requires params.name");
    };
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    let envelope = tools::dispatch(state, ctx, name, arguments).await;
    match serde_json::to_value(&envelope) {
        Ok(payload) => JsonRpcResponse::success(
            id,
            serde_json::json!({
                "content": [{ "type": "text", "text": payload.to_string() }],
                "isError": !envelope.success,
            }),
        ),
        Err(e) => JsonRpcResponse::failure(id, INTERNAL_ERROR, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use n8n_mcp_domain::config::{CacheConfig, N8nConfig, WebhookSecurityMode};

    fn state() -> AppState {
        AppState::new(N8nConfig::default(), CacheConfig::default(), WebhookSecurityMode::default())
    }

    #[tokio::test]
    async fn initialize_returns_protocol_version() {
        let req = JsonRpcRequest { jsonrpc: None, id: Some(Value::from(1)), method: "initialize".into(), params: None };
        let resp = handle_request(&state(), &InstanceContext::default(), req).await.unwrap();
        assert_eq!(resp.result.unwrap()["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn notification_produces_no_response() {
        let req = JsonRpcRequest { jsonrpc: None, id: None, method: "notifications/initialized".into(), params: None };
        let resp = handle_request(&state(), &InstanceContext::default(), req).await;
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn tools_list_includes_core_tools() {
        let req = JsonRpcRequest { jsonrpc: None, id: Some(Value::from(1)), method: "tools/list".into(), params: None };
        let resp = handle_request(&state(), &InstanceContext::default(), req).await.unwrap();
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().len();
        assert!(tools >= 15);
    }

    #[tokio::test]
    async fn tools_call_wraps_envelope_as_text_content() {
        let req = JsonRpcRequest {
            jsonrpc: None,
            id: Some(Value::from(1)),
            method: "tools/call".into(),
            params: Some(serde_json::json!({ "name": "n8n_diagnostic", "arguments": {} })),
        };
        let resp = handle_request(&state(), &InstanceContext::default(), req).await.unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], false);
        assert!(result["content"][0]["text"].as_str().unwrap().contains("catalogSize"));
    }
}
