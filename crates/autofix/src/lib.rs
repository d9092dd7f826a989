//! Auto-Fixer (C5): translates validator findings into Diff-Engine
//! operations at a configurable confidence threshold.
//!
//! [`propose_fixes`] never mutates anything — it is pure preview. Commit
//! mode (§4.5) is [`commit_fixes`], which hands the proposed operations to
//! the diff engine in atomic mode.

mod fixes;
mod path;

pub use fixes::{propose_fixes, FixType, ProposedFix};

use n8n_mcp_domain::validation::Confidence;
use n8n_mcp_domain::workflow::Workflow;
use n8n_mcp_domain::Error;

#[derive(Debug, Clone)]
pub struct AutofixConfig {
    /// `false` = preview (return operations only); `true` = commit.
    pub apply_fixes: bool,
    pub fix_types: Vec<FixType>,
    pub confidence_threshold: Confidence,
    pub max_fixes: usize,
}

impl Default for AutofixConfig {
    fn default() -> Self {
        Self {
            apply_fixes: false,
            fix_types: vec![
                FixType::ExpressionFormat,
                FixType::TypeversionCorrection,
                FixType::ErrorOutputConfig,
                FixType::NodeTypeCorrection,
                FixType::WebhookMissingPath,
            ],
            confidence_threshold: Confidence::High,
            max_fixes: 50,
        }
    }
}

fn confidence_rank(c: Confidence) -> u8 {
    match c {
        Confidence::Low => 0,
        Confidence::Medium => 1,
        Confidence::High => 2,
    }
}

/// Filters a raw fix list down to `config.fix_types`, the confidence
/// threshold (a fix at or above the threshold survives), and `max_fixes`.
pub fn filter_fixes(fixes: Vec<ProposedFix>, config: &AutofixConfig) -> Vec<ProposedFix> {
    let min_rank = confidence_rank(config.confidence_threshold);
    fixes
        .into_iter()
        .filter(|f| config.fix_types.contains(&f.fix_type))
        .filter(|f| confidence_rank(f.confidence) >= min_rank)
        .take(config.max_fixes)
        .collect()
}

/// Applies the filtered, concrete (non-advisory) fixes to `workflow` in
/// atomic mode. Advisory fixes (no attached operation) are never applied,
/// regardless of `config.apply_fixes`.
pub fn commit_fixes(workflow: &Workflow, fixes: &[ProposedFix]) -> Result<Workflow, Error> {
    let ops: Vec<_> = fixes.iter().filter_map(|f| f.op.clone()).collect();
    n8n_mcp_diffengine::apply_atomic_or_error(workflow, &ops)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_fixes_respects_confidence_threshold() {
        let fixes = vec![
            ProposedFix {
                fix_type: FixType::ExpressionFormat,
                confidence: Confidence::Low,
                rationale: "x".into(),
                op: None,
            },
            ProposedFix {
                fix_type: FixType::ExpressionFormat,
                confidence: Confidence::High,
                rationale: "y".into(),
                op: None,
            },
        ];
        let config = AutofixConfig {
            confidence_threshold: Confidence::High,
            ..Default::default()
        };
        let filtered = filter_fixes(fixes, &config);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].rationale, "y");
    }

    #[test]
    fn filter_fixes_respects_fix_type_allowlist() {
        let fixes = vec![ProposedFix {
            fix_type: FixType::WebhookMissingPath,
            confidence: Confidence::High,
            rationale: "x".into(),
            op: None,
        }];
        let config = AutofixConfig {
            fix_types: vec![FixType::ExpressionFormat],
            confidence_threshold: Confidence::Low,
            ..Default::default()
        };
        assert!(filter_fixes(fixes, &config).is_empty());
    }

    #[test]
    fn filter_fixes_respects_max_fixes() {
        let fixes: Vec<_> = (0..10)
            .map(|_| ProposedFix {
                fix_type: FixType::ExpressionFormat,
                confidence: Confidence::High,
                rationale: "x".into(),
                op: None,
            })
            .collect();
        let config = AutofixConfig {
            max_fixes: 3,
            confidence_threshold: Confidence::Low,
            ..Default::default()
        };
        assert_eq!(filter_fixes(fixes, &config).len(), 3);
    }
}
