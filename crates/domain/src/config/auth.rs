use serde::{Deserialize, Serialize};

/// Minimum length required for `AUTH_TOKEN` outside of development (§6).
pub const MIN_PRODUCTION_TOKEN_LEN: usize = 32;

/// Values that must never be accepted as a real `AUTH_TOKEN` in production
/// — placeholders left over from an example config.
pub const PLACEHOLDER_TOKENS: &[&str] = &["changeme", "your-token-here", "default", ""];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "d_api_token_env")]
    pub api_token_env: String,
    #[serde(default = "d_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
    #[serde(default = "d_rate_limit_max")]
    pub rate_limit_max: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_token_env: d_api_token_env(),
            rate_limit_window_secs: d_rate_limit_window_secs(),
            rate_limit_max: d_rate_limit_max(),
        }
    }
}

fn d_api_token_env() -> String {
    "AUTH_TOKEN".into()
}
fn d_rate_limit_window_secs() -> u64 {
    60
}
fn d_rate_limit_max() -> u32 {
    100
}
