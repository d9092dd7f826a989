//! Tool Dispatch Layer (C8, §4.8, §6): the core-relevant subset of the
//! tool surface — workflow CRUD, diff-apply, validate, autofix, webhook
//! trigger, execution management, and ops tools. The ~60 documentation
//! tools over the node catalog are outside this layer's scope.

use crate::envelope::Envelope;
use n8n_mcp_autofix::{AutofixConfig, FixType};
use n8n_mcp_diffengine::apply;
use n8n_mcp_domain::diffop::{ApplyMode, DiffOperation};
use n8n_mcp_domain::instance::InstanceContext;
use n8n_mcp_domain::validation::{Confidence, ValidationProfile};
use n8n_mcp_domain::workflow::Workflow;
use n8n_mcp_domain::Error;
use n8n_mcp_restclient::{ListWorkflowsQuery, WebhookInvocation};
use serde::Deserialize;
use serde_json::Value;

use crate::state::AppState;

/// Parses `args` into `T`, mapping a failure onto `Envelope::invalid_input`.
fn parse_args<T: for<'de> Deserialize<'de>>(args: Value) -> Result<T, Envelope> {
    serde_json::from_value(args.clone())
        .map_err(|e| Envelope::invalid_input(serde_json::json!({ "reason": e.to_string(), "received": args })))
}

/// Dispatches one tool call to its handler, always returning an envelope
/// (never propagating an `Err` out of this layer — §4.8).
pub async fn dispatch(state: &AppState, ctx: &InstanceContext, tool: &str, args: Value) -> Envelope {
    let result = match tool {
        "n8n_create_workflow" => create_workflow(state, ctx, args).await,
        "n8n_update_full_workflow" => update_full_workflow(state, ctx, args).await,
        "n8n_update_partial_workflow" => update_partial_workflow(state, ctx, args).await,
        "n8n_get_workflow" => get_workflow(state, ctx, args, WorkflowView::Full).await,
        "n8n_get_workflow_details" => get_workflow(state, ctx, args, WorkflowView::Details).await,
        "n8n_get_workflow_structure" => get_workflow(state, ctx, args, WorkflowView::Structure).await,
        "n8n_get_workflow_minimal" => get_workflow(state, ctx, args, WorkflowView::Minimal).await,
        "n8n_list_workflows" => list_workflows(state, ctx, args).await,
        "n8n_delete_workflow" => delete_workflow(state, ctx, args).await,
        "n8n_validate_workflow" => validate_workflow(state, ctx, args).await,
        "n8n_autofix_workflow" => autofix_workflow(state, ctx, args).await,
        "n8n_trigger_webhook_workflow" => trigger_webhook_workflow(state, args).await,
        "n8n_list_executions" => list_executions(state, ctx).await,
        "n8n_get_execution" => get_execution(state, ctx, args).await,
        "n8n_delete_execution" => delete_execution(state, ctx, args).await,
        "n8n_health_check" => health_check(state, ctx).await,
        "n8n_diagnostic" => Ok(diagnostic(state)),
        other => Err(Error::NotConfigured(format!("unknown tool: {other}"))),
    };

    match result {
        Ok(data) => Envelope::ok(data),
        Err(err) => Envelope::from_error(&err),
    }
}

#[derive(Debug, Deserialize)]
struct CreateWorkflowArgs {
    #[serde(flatten)]
    workflow: Workflow,
}

async fn create_workflow(state: &AppState, ctx: &InstanceContext, args: Value) -> Result<Value, Error> {
    let parsed: CreateWorkflowArgs = serde_json::from_value(args).map_err(|e| Error::InputInvalid(e.to_string()))?;
    let client = state.resolve_client(ctx).await?;
    let created = client.create_workflow(&parsed.workflow).await?;
    serde_json::to_value(created).map_err(Error::Json)
}

#[derive(Debug, Deserialize)]
struct UpdateFullWorkflowArgs {
    id: String,
    name: Option<String>,
    nodes: Option<Vec<n8n_mcp_domain::workflow::Node>>,
    connections: Option<n8n_mcp_domain::workflow::Connections>,
    settings: Option<serde_json::Map<String, Value>>,
}

async fn update_full_workflow(state: &AppState, ctx: &InstanceContext, args: Value) -> Result<Value, Error> {
    let parsed: UpdateFullWorkflowArgs = serde_json::from_value(args).map_err(|e| Error::InputInvalid(e.to_string()))?;
    let client = state.resolve_client(ctx).await?;
    let mut current = client.get_workflow(&parsed.id).await?;
    if let Some(name) = parsed.name {
        current.name = name;
    }
    if let Some(nodes) = parsed.nodes {
        current.nodes = nodes;
    }
    if let Some(connections) = parsed.connections {
        current.connections = connections;
    }
    if let Some(settings) = parsed.settings {
        current.settings = Some(settings);
    }
    let updated = client.update_workflow(&parsed.id, &current).await?;
    serde_json::to_value(updated).map_err(Error::Json)
}

#[derive(Debug, Deserialize)]
struct UpdatePartialWorkflowArgs {
    id: String,
    operations: Vec<DiffOperation>,
    #[serde(default)]
    validate_only: bool,
    #[serde(default)]
    continue_on_error: bool,
}

async fn update_partial_workflow(state: &AppState, ctx: &InstanceContext, args: Value) -> Result<Value, Error> {
    let parsed: UpdatePartialWorkflowArgs =
        serde_json::from_value(args).map_err(|e| Error::InputInvalid(e.to_string()))?;
    let client = state.resolve_client(ctx).await?;
    let current = client.get_workflow(&parsed.id).await?;

    let mode = if parsed.continue_on_error { ApplyMode::ContinueOnError } else { ApplyMode::Atomic };
    let outcome = apply(&current, &parsed.operations, mode);

    if parsed.validate_only || !outcome.committed {
        if !outcome.committed && !parsed.validate_only {
            let failure = outcome.results.iter().find(|r| !r.applied);
            if let Some(r) = failure {
                return Err(Error::DiffFailure {
                    index: r.index,
                    reason: r.reason.clone().unwrap_or_default(),
                });
            }
        }
        return serde_json::to_value(serde_json::json!({
            "committed": outcome.committed,
            "results": outcome.results,
            "workflow": outcome.workflow,
        }))
        .map_err(Error::Json);
    }

    let updated = client.update_workflow(&parsed.id, &outcome.workflow).await?;
    serde_json::to_value(serde_json::json!({
        "committed": true,
        "results": outcome.results,
        "workflow": updated,
    }))
    .map_err(Error::Json)
}

enum WorkflowView {
    Full,
    Details,
    Structure,
    Minimal,
}

#[derive(Debug, Deserialize)]
struct IdArgs {
    id: String,
}

async fn get_workflow(state: &AppState, ctx: &InstanceContext, args: Value, view: WorkflowView) -> Result<Value, Error> {
    let parsed: IdArgs = parse_id_args(args)?;
    let client = state.resolve_client(ctx).await?;
    let workflow = client.get_workflow(&parsed.id).await?;
    Ok(shape_workflow(&workflow, view))
}

fn parse_id_args(args: Value) -> Result<IdArgs, Error> {
    serde_json::from_value(args).map_err(|e| Error::InputInvalid(e.to_string()))
}

fn shape_workflow(workflow: &Workflow, view: WorkflowView) -> Value {
    match view {
        WorkflowView::Full | WorkflowView::Details => serde_json::to_value(workflow).unwrap_or(Value::Null),
        WorkflowView::Structure => serde_json::json!({
            "id": workflow.id,
            "name": workflow.name,
            "nodeNames": workflow.node_names(),
            "connections": workflow.connections,
        }),
        WorkflowView::Minimal => serde_json::json!({
            "id": workflow.id,
            "name": workflow.name,
            "active": workflow.active,
        }),
    }
}

async fn list_workflows(state: &AppState, ctx: &InstanceContext, args: Value) -> Result<Value, Error> {
    #[derive(Deserialize, Default)]
    #[serde(rename_all = "camelCase")]
    struct Args {
        limit: Option<u32>,
        cursor: Option<String>,
        active: Option<bool>,
        #[serde(default)]
        tags: Vec<String>,
        project_id: Option<String>,
        exclude_pinned_data: Option<bool>,
    }
    let parsed: Args = serde_json::from_value(args).map_err(|e| Error::InputInvalid(e.to_string()))?;
    let client = state.resolve_client(ctx).await?;
    client
        .list_workflows(&ListWorkflowsQuery {
            limit: parsed.limit,
            cursor: parsed.cursor,
            active: parsed.active,
            tags: parsed.tags,
            project_id: parsed.project_id,
            exclude_pinned_data: parsed.exclude_pinned_data,
        })
        .await
}

async fn delete_workflow(state: &AppState, ctx: &InstanceContext, args: Value) -> Result<Value, Error> {
    let parsed = parse_id_args(args)?;
    let client = state.resolve_client(ctx).await?;
    client.delete_workflow(&parsed.id).await?;
    Ok(serde_json::json!({ "deleted": true, "id": parsed.id }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ValidateOptions {
    #[serde(default)]
    profile: ValidationProfile,
}

#[derive(Debug, Deserialize)]
struct ValidateWorkflowArgs {
    id: String,
    #[serde(default)]
    options: ValidateOptions,
}

async fn validate_workflow(state: &AppState, ctx: &InstanceContext, args: Value) -> Result<Value, Error> {
    let parsed: ValidateWorkflowArgs = serde_json::from_value(args).map_err(|e| Error::InputInvalid(e.to_string()))?;
    let client = state.resolve_client(ctx).await?;
    let workflow = client.get_workflow(&parsed.id).await?;
    let result = n8n_mcp_validator::validate(&workflow, state.catalog, parsed.options.profile);
    serde_json::to_value(result).map_err(Error::Json)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AutofixWorkflowArgs {
    id: String,
    #[serde(default)]
    apply_fixes: bool,
    #[serde(default)]
    fix_types: Option<Vec<FixType>>,
    #[serde(default)]
    confidence_threshold: Option<Confidence>,
    #[serde(default)]
    max_fixes: Option<usize>,
}

async fn autofix_workflow(state: &AppState, ctx: &InstanceContext, args: Value) -> Result<Value, Error> {
    let parsed: AutofixWorkflowArgs = serde_json::from_value(args).map_err(|e| Error::InputInvalid(e.to_string()))?;
    let client = state.resolve_client(ctx).await?;
    let workflow = client.get_workflow(&parsed.id).await?;
    let validation = n8n_mcp_validator::validate(&workflow, state.catalog, ValidationProfile::default());

    let mut config = AutofixConfig { apply_fixes: parsed.apply_fixes, ..AutofixConfig::default() };
    if let Some(types) = parsed.fix_types {
        config.fix_types = types;
    }
    if let Some(threshold) = parsed.confidence_threshold {
        config.confidence_threshold = threshold;
    }
    if let Some(max) = parsed.max_fixes {
        config.max_fixes = max;
    }

    let proposed = n8n_mcp_autofix::propose_fixes(&workflow, &validation, &[]);
    let filtered = n8n_mcp_autofix::filter_fixes(proposed, &config);

    if !config.apply_fixes {
        return serde_json::to_value(serde_json::json!({ "applied": false, "fixes": describe_fixes(&filtered) }))
            .map_err(Error::Json);
    }

    let fixed = n8n_mcp_autofix::commit_fixes(&workflow, &filtered)?;
    let updated = client.update_workflow(&parsed.id, &fixed).await?;
    serde_json::to_value(serde_json::json!({
        "applied": true,
        "fixes": describe_fixes(&filtered),
        "workflow": updated,
    }))
    .map_err(Error::Json)
}

fn describe_fixes(fixes: &[n8n_mcp_autofix::ProposedFix]) -> Value {
    Value::Array(
        fixes
            .iter()
            .map(|f| {
                serde_json::json!({
                    "fixType": format!("{:?}", f.fix_type),
                    "confidence": format!("{:?}", f.confidence),
                    "rationale": f.rationale,
                    "advisoryOnly": f.op.is_none(),
                })
            })
            .collect(),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TriggerWebhookArgs {
    webhook_url: String,
    #[serde(default = "default_method")]
    http_method: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    headers: std::collections::HashMap<String, String>,
    #[serde(default)]
    wait_for_response: bool,
}

fn default_method() -> String {
    "POST".to_string()
}

async fn trigger_webhook_workflow(state: &AppState, args: Value) -> Result<Value, Error> {
    let parsed: TriggerWebhookArgs = serde_json::from_value(args).map_err(|e| Error::InputInvalid(e.to_string()))?;
    let invocation = WebhookInvocation {
        url: parsed.webhook_url,
        http_method: parsed.http_method,
        data: parsed.data,
        headers: parsed.headers,
        wait_for_response: parsed.wait_for_response,
    };
    let timeout = std::time::Duration::from_millis(state.n8n_config.webhook_wait_timeout_ms);
    n8n_mcp_restclient::trigger_webhook(&invocation, state.webhook_security, timeout).await
}

async fn list_executions(state: &AppState, ctx: &InstanceContext) -> Result<Value, Error> {
    let client = state.resolve_client(ctx).await?;
    client.list_executions().await
}

async fn get_execution(state: &AppState, ctx: &InstanceContext, args: Value) -> Result<Value, Error> {
    let parsed = parse_id_args(args)?;
    let client = state.resolve_client(ctx).await?;
    client.get_execution(&parsed.id).await
}

async fn delete_execution(state: &AppState, ctx: &InstanceContext, args: Value) -> Result<Value, Error> {
    let parsed = parse_id_args(args)?;
    let client = state.resolve_client(ctx).await?;
    client.delete_execution(&parsed.id).await?;
    Ok(serde_json::json!({ "deleted": true, "id": parsed.id }))
}

async fn health_check(state: &AppState, ctx: &InstanceContext) -> Result<Value, Error> {
    let client = state.resolve_client(ctx).await?;
    client.health_check().await
}

fn diagnostic(state: &AppState) -> Value {
    let metrics = state.cache.metrics();
    serde_json::json!({
        "catalogSize": state.catalog.len(),
        "cache": {
            "size": metrics.size,
            "hits": metrics.hits,
            "misses": metrics.misses,
            "evictions": metrics.evictions,
            "highWater": metrics.high_water,
        },
        "webhookSecurityMode": format!("{:?}", state.webhook_security),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_tool_yields_error_envelope() {
        let state = AppState::new(
            n8n_mcp_domain::config::N8nConfig::default(),
            n8n_mcp_domain::config::CacheConfig::default(),
            n8n_mcp_domain::config::WebhookSecurityMode::default(),
        );
        let ctx = InstanceContext::default();
        let env = dispatch(&state, &ctx, "not_a_real_tool", Value::Null).await;
        assert!(!env.success);
    }

    #[tokio::test]
    async fn diagnostic_never_touches_the_host() {
        let state = AppState::new(
            n8n_mcp_domain::config::N8nConfig::default(),
            n8n_mcp_domain::config::CacheConfig::default(),
            n8n_mcp_domain::config::WebhookSecurityMode::default(),
        );
        let ctx = InstanceContext::default();
        let env = dispatch(&state, &ctx, "n8n_diagnostic", Value::Null).await;
        assert!(env.success);
        assert!(env.data.unwrap()["catalogSize"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn missing_required_id_is_invalid_input() {
        let state = AppState::new(
            n8n_mcp_domain::config::N8nConfig::default(),
            n8n_mcp_domain::config::CacheConfig::default(),
            n8n_mcp_domain::config::WebhookSecurityMode::default(),
        );
        let ctx = InstanceContext::default();
        let env = dispatch(&state, &ctx, "n8n_get_workflow", serde_json::json!({})).await;
        assert!(!env.success);
        assert_eq!(env.code, Some("INPUT_INVALID"));
    }
}
