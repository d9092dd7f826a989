//! Validation result vocabulary (§3, §4.3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Stable, machine-readable finding codes. New codes may be added; existing
/// ones are never renumbered or repurposed — tool callers match on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    MissingRequiredField,
    EmptyWorkflowName,
    NoNodes,
    InvalidSingleNodeWorkflow,
    InvalidTypePrefix,
    MissingRequiredProperty,
    InvalidOptionValue,
    NumericOutOfRange,
    TypeMismatch,
    InvalidResourceLocator,
    PropertySetWhileHidden,
    CommonPropertyAbsent,
    EndpointNodeNotFound,
    EndpointUsesIdNotName,
    InvalidConnectionKind,
    EmptyConnectionsMultiNode,
    ExpressionMissingEqualsPrefix,
    ExpressionSuperfluousEqualsPrefix,
    ExpressionMalformed,
    MissingLanguageModel,
    TooManyLanguageModels,
    TooManyMemoryInputs,
    StreamingWithMainOutput,
    StreamingWrongTarget,
    BasicChainWrongWiring,
    UnknownAiToolType,
    MissingToolParameter,
    MissingToolCredential,
}

/// A single validation finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    pub code: FindingCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

impl Finding {
    pub fn error(code: FindingCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            node_name: None,
            code,
            message: message.into(),
            details: None,
            confidence: None,
        }
    }

    pub fn warning(code: FindingCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            node_name: None,
            code,
            message: message.into(),
            details: None,
            confidence: None,
        }
    }

    pub fn with_node(mut self, name: impl Into<String>) -> Self {
        self.node_name = Some(name.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statistics {
    pub total_nodes: usize,
    pub enabled_nodes: usize,
    pub trigger_nodes: usize,
    pub valid_connections: usize,
    pub invalid_connections: usize,
    pub expressions_validated: usize,
}

/// The overall result of validating a workflow (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub suggestions: Vec<String>,
    pub statistics: Statistics,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            suggestions: Vec::new(),
            statistics: Statistics::default(),
        }
    }

    pub fn push(&mut self, finding: Finding) {
        match finding.severity {
            Severity::Error => {
                self.valid = false;
                self.errors.push(finding);
            }
            Severity::Warning => self.warnings.push(finding),
        }
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for f in findings {
            self.push(f);
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator depth/strictness profile (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationProfile {
    Minimal,
    Runtime,
    #[default]
    AiFriendly,
    Strict,
}
