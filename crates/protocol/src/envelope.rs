//! The uniform tool-call result envelope (§4.8).

use n8n_mcp_domain::sanitize::sanitize_message;
use n8n_mcp_domain::{Error, ErrorCode};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self { success: true, data: Some(data), message: None, error: None, code: None, details: None }
    }

    /// Input-validation failures at the schema-parse boundary (§4.8, §7).
    pub fn invalid_input(details: Value) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some("Invalid input".to_string()),
            code: Some(error_code_str(ErrorCode::InputInvalid)),
            details: Some(details),
        }
    }

    /// Maps a domain error onto the envelope, sanitizing the message (§7).
    pub fn from_error(err: &Error) -> Self {
        let details = match err {
            Error::DiffFailure { index, reason } => {
                Some(serde_json::json!({ "opIndex": index, "reason": sanitize_message(reason) }))
            }
            _ => None,
        };
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(sanitize_message(&err.to_string())),
            code: Some(error_code_str(err.code())),
            details,
        }
    }
}

fn error_code_str(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::InputInvalid => "INPUT_INVALID",
        ErrorCode::NotConfigured => "NOT_CONFIGURED",
        ErrorCode::ApiError => "API_ERROR",
        ErrorCode::NotFound => "NOT_FOUND",
        ErrorCode::AuthError => "AUTH_ERROR",
        ErrorCode::Transport => "TRANSPORT",
        ErrorCode::ValidationFailure => "VALIDATION_FAILURE",
        ErrorCode::DiffFailure => "DIFF_FAILURE",
        ErrorCode::Internal => "INTERNAL",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_has_no_error_fields() {
        let env = Envelope::ok(serde_json::json!({"id": "1"}));
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["success"], true);
        assert!(v.get("error").is_none());
    }

    #[test]
    fn from_error_sanitizes_message() {
        let err = Error::Auth("token Bearer abcdef0123456789".to_string());
        let env = Envelope::from_error(&err);
        assert!(!env.error.unwrap().contains("abcdef0123456789"));
        assert_eq!(env.code, Some("AUTH_ERROR"));
    }

    #[test]
    fn diff_failure_surfaces_op_index() {
        let err = Error::DiffFailure { index: 2, reason: "boom".into() };
        let env = Envelope::from_error(&err);
        assert_eq!(env.details.unwrap()["opIndex"], 2);
    }
}
