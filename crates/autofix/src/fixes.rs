use crate::path::with_path_set;
use n8n_mcp_domain::diffop::{DiffOperation, UpdateNodePatch};
use n8n_mcp_domain::validation::{Confidence, FindingCode, ValidationResult};
use n8n_mcp_domain::workflow::Workflow;
use n8n_mcp_exprfmt::{ExpressionClass, ExpressionIssue};
use n8n_mcp_normalize::normalize_type;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FixType {
    ExpressionFormat,
    TypeversionCorrection,
    ErrorOutputConfig,
    NodeTypeCorrection,
    WebhookMissingPath,
}

/// A candidate fix. `op` is `None` for advisory-only fixes (§4.5's
/// `error-output-config`, which can only ever *suggest* a rewire since it
/// has no concrete target) — those are never applied, even in commit mode.
#[derive(Debug, Clone)]
pub struct ProposedFix {
    pub fix_type: FixType,
    pub confidence: Confidence,
    pub rationale: String,
    pub op: Option<DiffOperation>,
}

/// Minimum supported `typeVersion` per normalized type. A stand-in for
/// the catalog's real per-type minimum-version metadata, which the
/// embedded catalog subset doesn't carry.
fn min_supported_version(canonical_type: &str) -> Option<f64> {
    let table: HashMap<&str, f64> = HashMap::from([
        ("httpRequest", 4.0),
        ("webhook", 1.1),
        ("set", 3.0),
        ("switch", 3.0),
    ]);
    table.get(canonical_type).copied()
}

/// `expr_issues` is accepted for interface symmetry with C4's output but
/// not consumed directly: its path-only records don't carry which node
/// they belong to, so [`expression_format_fixes`] re-scans node by node
/// instead of trying to re-attribute this list.
pub fn propose_fixes(
    workflow: &Workflow,
    validation: &ValidationResult,
    expr_issues: &[ExpressionIssue],
) -> Vec<ProposedFix> {
    let _ = expr_issues;
    let mut fixes = Vec::new();
    fixes.extend(expression_format_fixes(workflow));
    fixes.extend(webhook_missing_path_fixes(workflow, validation));
    fixes.extend(typeversion_fixes(workflow));
    fixes.extend(node_type_correction_fixes(workflow, validation));
    fixes.extend(error_output_config_fixes(workflow));
    fixes
}

fn expression_format_fixes(workflow: &Workflow) -> Vec<ProposedFix> {
    let mut fixes = Vec::new();
    for node in &workflow.nodes {
        let params = serde_json::Value::Object(node.parameters.clone());
        let node_issues = n8n_mcp_exprfmt::scan_parameters_full(&params);
        for issue in node_issues {
            let Some(fix_value) = &issue.suggested_fix else {
                continue;
            };
            if !matches!(
                issue.class,
                ExpressionClass::MissingEqualsPrefix | ExpressionClass::SuperfluousEqualsPrefix
            ) {
                continue;
            }
            let patched = with_path_set(
                &node.parameters,
                &issue.path,
                serde_json::Value::String(fix_value.clone()),
            );
            fixes.push(ProposedFix {
                fix_type: FixType::ExpressionFormat,
                confidence: issue.confidence,
                rationale: format!("fix expression format at {:?} on node {:?}", issue.path, node.name),
                op: Some(DiffOperation::UpdateNode {
                    name: node.name.clone(),
                    patch: UpdateNodePatch {
                        parameters: Some(patched),
                        ..Default::default()
                    },
                }),
            });
        }
    }
    fixes
}

fn webhook_missing_path_fixes(workflow: &Workflow, validation: &ValidationResult) -> Vec<ProposedFix> {
    validation
        .errors
        .iter()
        .filter(|f| f.code == FindingCode::MissingRequiredProperty && f.message.contains("\"path\""))
        .filter_map(|f| {
            let node_name = f.node_name.as_ref()?;
            let node = workflow.node_by_name(node_name)?;
            if normalize_type(&node.node_type) != "webhook" {
                return None;
            }
            let mut patch = UpdateNodePatch::default();
            let mut params = node.parameters.clone();
            params.insert(
                "path".into(),
                serde_json::Value::String(Uuid::new_v4().to_string()),
            );
            patch.parameters = Some(params);
            Some(ProposedFix {
                fix_type: FixType::WebhookMissingPath,
                confidence: Confidence::High,
                rationale: format!("generate a webhook path for {node_name:?}"),
                op: Some(DiffOperation::UpdateNode {
                    name: node_name.clone(),
                    patch,
                }),
            })
        })
        .collect()
}

fn typeversion_fixes(workflow: &Workflow) -> Vec<ProposedFix> {
    workflow
        .nodes
        .iter()
        .filter_map(|node| {
            let canonical = normalize_type(&node.node_type);
            let min = min_supported_version(&canonical)?;
            if node.type_version >= min {
                return None;
            }
            Some(ProposedFix {
                fix_type: FixType::TypeversionCorrection,
                confidence: Confidence::Medium,
                rationale: format!(
                    "raise {:?} typeVersion from {} to catalog minimum {min}",
                    node.name, node.type_version
                ),
                op: Some(DiffOperation::UpdateNode {
                    name: node.name.clone(),
                    patch: UpdateNodePatch {
                        type_version: Some(min),
                        ..Default::default()
                    },
                }),
            })
        })
        .collect()
}

fn node_type_correction_fixes(workflow: &Workflow, validation: &ValidationResult) -> Vec<ProposedFix> {
    validation
        .errors
        .iter()
        .filter(|f| f.code == FindingCode::InvalidTypePrefix)
        .filter_map(|f| {
            let node_name = f.node_name.as_ref()?;
            let node = workflow.node_by_name(node_name)?;
            let canonical = normalize_type(&node.node_type);
            Some(ProposedFix {
                fix_type: FixType::NodeTypeCorrection,
                confidence: Confidence::High,
                rationale: format!("correct {node_name:?}'s type to the canonical short form {canonical:?}"),
                op: Some(DiffOperation::UpdateNode {
                    name: node_name.clone(),
                    patch: UpdateNodePatch {
                        node_type: Some(canonical),
                        ..Default::default()
                    },
                }),
            })
        })
        .collect()
}

fn error_output_config_fixes(workflow: &Workflow) -> Vec<ProposedFix> {
    workflow
        .nodes
        .iter()
        .filter(|n| n.on_error.as_deref() == Some("continueErrorOutput"))
        .filter(|n| {
            let has_error_slot = workflow
                .connections
                .slots(&n.name, n8n_mcp_domain::workflow::ConnectionKind::Main)
                .map(|slots| slots.len() > 1 && !slots[1].is_empty())
                .unwrap_or(false);
            !has_error_slot
        })
        .map(|n| ProposedFix {
            fix_type: FixType::ErrorOutputConfig,
            confidence: Confidence::Low,
            rationale: format!(
                "{:?} has onError=continueErrorOutput but no error-output connection; wire output slot 1 to an error handler",
                n.name
            ),
            op: None,
        })
        .collect()
}
