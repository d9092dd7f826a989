//! Expression-format validation (C4).
//!
//! Scans a node's `parameters` tree for values that look like host-templated
//! expressions and classifies each one. Used directly by validator Pass 4
//! and by the auto-fixer, which turns `MissingEqualsPrefix` /
//! `SuperfluousEqualsPrefix` findings into diff-engine patches.

use n8n_mcp_domain::validation::Confidence;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionClass {
    Correct,
    MissingEqualsPrefix,
    SuperfluousEqualsPrefix,
    Malformed,
}

#[derive(Debug, Clone)]
pub struct ExpressionIssue {
    /// Dotted path into the node's `parameters` object, e.g. `options.url`.
    pub path: String,
    pub class: ExpressionClass,
    pub value: String,
    pub suggested_fix: Option<String>,
    pub confidence: Confidence,
}

fn runtime_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$json|\$node\(|\$input|\$now|\$workflow|\$items\(").unwrap())
}

/// Recursively scans a parameters tree, returning one issue per
/// non-`Correct` string value found. Only strings are inspected; numbers,
/// booleans, null, and structurally empty containers never produce
/// issues.
pub fn scan_parameters(parameters: &Value) -> Vec<ExpressionIssue> {
    let mut issues = Vec::new();
    walk(parameters, String::new(), &mut issues);
    issues
}

fn walk(value: &Value, path: String, out: &mut Vec<ExpressionIssue>) {
    match value {
        Value::String(s) => {
            if let Some(issue) = classify(&path, s) {
                out.push(issue);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let child_path = if path.is_empty() {
                    format!("[{i}]")
                } else {
                    format!("{path}[{i}]")
                };
                walk(item, child_path, out);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                walk(v, child_path, out);
            }
        }
        _ => {}
    }
}

fn classify(path: &str, raw: &str) -> Option<ExpressionIssue> {
    let has_template_open = raw.contains("{{");
    let has_template_close = raw.contains("}}");
    let has_runtime_ref = runtime_ref_re().is_match(raw);
    let looks_templated = has_template_open || has_template_close || has_runtime_ref;

    if !looks_templated {
        return None;
    }

    let open_count = raw.matches("{{").count();
    let close_count = raw.matches("}}").count();
    let starts_with_equals = raw.starts_with('=');

    if open_count != close_count {
        return Some(ExpressionIssue {
            path: path.to_string(),
            class: ExpressionClass::Malformed,
            value: raw.to_string(),
            suggested_fix: None,
            confidence: Confidence::Low,
        });
    }

    if starts_with_equals {
        return Some(ExpressionIssue {
            path: path.to_string(),
            class: ExpressionClass::Correct,
            value: raw.to_string(),
            suggested_fix: None,
            confidence: Confidence::High,
        });
    }

    Some(ExpressionIssue {
        path: path.to_string(),
        class: ExpressionClass::MissingEqualsPrefix,
        value: raw.to_string(),
        suggested_fix: Some(format!("={raw}")),
        confidence: Confidence::High,
    })
}

/// A literal `=` prefix with no template content or runtime reference is
/// wasted and signals caller confusion; flagged separately from
/// [`classify`] because the "no template markers" branch there returns
/// `None` (nothing looks templated), so it needs its own check over the
/// already-`=`-prefixed value.
pub fn detect_superfluous_prefix(path: &str, raw: &str) -> Option<ExpressionIssue> {
    if !raw.starts_with('=') {
        return None;
    }
    let body = &raw[1..];
    let has_template = body.contains("{{") && body.contains("}}");
    let has_runtime_ref = runtime_ref_re().is_match(body);
    if has_template || has_runtime_ref {
        return None;
    }
    Some(ExpressionIssue {
        path: path.to_string(),
        class: ExpressionClass::SuperfluousEqualsPrefix,
        value: raw.to_string(),
        suggested_fix: Some(body.to_string()),
        confidence: Confidence::Medium,
    })
}

/// Full scan combining [`scan_parameters`]'s template-shaped findings with
/// the superfluous-prefix check, which must inspect every `=`-prefixed
/// string regardless of whether it looks templated.
pub fn scan_parameters_full(parameters: &Value) -> Vec<ExpressionIssue> {
    let mut issues = scan_parameters(parameters);
    let mut extra = Vec::new();
    walk_all_strings(parameters, String::new(), &mut extra);
    for (path, raw) in extra {
        if let Some(issue) = detect_superfluous_prefix(&path, &raw) {
            issues.push(issue);
        }
    }
    issues
}

fn walk_all_strings(value: &Value, path: String, out: &mut Vec<(String, String)>) {
    match value {
        Value::String(s) => out.push((path, s.clone())),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let child_path = if path.is_empty() {
                    format!("[{i}]")
                } else {
                    format!("{path}[{i}]")
                };
                walk_all_strings(item, child_path, out);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                walk_all_strings(v, child_path, out);
            }
        }
        _ => {}
    }
}
