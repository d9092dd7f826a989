use serde::{Deserialize, Serialize};

/// Configuration for the process-wide singleton REST client (§4.6
/// "Fallback") and the default retry/timeout policy for all host calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct N8nConfig {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "d_timeout_ms")]
    pub api_timeout_ms: u64,
    #[serde(default = "d_max_retries")]
    pub max_retries: u32,
    #[serde(default = "d_webhook_timeout_ms")]
    pub webhook_wait_timeout_ms: u64,
}

impl Default for N8nConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            api_timeout_ms: d_timeout_ms(),
            max_retries: d_max_retries(),
            webhook_wait_timeout_ms: d_webhook_timeout_ms(),
        }
    }
}

fn d_timeout_ms() -> u64 {
    30_000
}
fn d_max_retries() -> u32 {
    3
}
fn d_webhook_timeout_ms() -> u64 {
    120_000
}
