//! Per-request instance context (§3, §4.6).
//!
//! Synthesized per inbound request from transport headers (HTTP mode) or
//! from process configuration (stdio mode), validated, hashed into a cache
//! key, then discarded at the end of the request. The hash is SHA-256 over
//! `url|key|instanceId` — never the raw credentials — so cache keys are
//! safe to hold in a long-lived map and to log (truncated, see
//! `n8n-mcp-clientcache`).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Maximum accepted length for any single context field, to keep the
/// hashed cache key bounded and to reject obviously-malformed headers
/// before they reach the REST client.
pub const MAX_FIELD_LEN: usize = 4096;

impl InstanceContext {
    /// Validate field lengths and that `api_url`, if present, parses as a
    /// URL. Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("api_url", &self.api_url),
            ("api_key", &self.api_key),
            ("instance_id", &self.instance_id),
            ("session_id", &self.session_id),
        ] {
            if let Some(v) = value {
                if v.len() > MAX_FIELD_LEN {
                    return Err(format!("{name} exceeds maximum length"));
                }
            }
        }
        if let Some(url) = &self.api_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err("api_url must be an http(s) URL".to_string());
            }
        }
        Ok(())
    }

    /// The cache key: lowercase hex SHA-256 over `url|key|instanceId`.
    /// Missing fields serialize as the empty string, keeping the key stable
    /// across requests that consistently omit the same field.
    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.api_url.as_deref().unwrap_or("").as_bytes());
        hasher.update(b"|");
        hasher.update(self.api_key.as_deref().unwrap_or("").as_bytes());
        hasher.update(b"|");
        hasher.update(self.instance_id.as_deref().unwrap_or("").as_bytes());
        hex::encode(hasher.finalize())
    }

    /// First 8 hex chars of the cache key — the only thing the client
    /// cache is allowed to log (§3, §4.6, §8 Testable Property 6).
    pub fn cache_key_prefix(&self) -> String {
        self.cache_key().chars().take(8).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.api_url.is_none() && self.api_key.is_none() && self.instance_id.is_none()
    }
}
