use serde::{Deserialize, Serialize};

/// SSRF protection mode for webhook-trigger invocation (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookSecurityMode {
    Strict,
    #[default]
    Moderate,
    Permissive,
}

impl WebhookSecurityMode {
    pub fn from_env_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "moderate" => Some(Self::Moderate),
            "permissive" => Some(Self::Permissive),
            _ => None,
        }
    }
}
