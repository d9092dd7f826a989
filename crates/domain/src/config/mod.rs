//! Layered configuration: compiled-in defaults, overridden by a TOML file,
//! overridden by environment variables (§6). Mirrors the module-per-concern
//! layout used by the rest of the workspace's config: each subsystem gets
//! its own file and is aggregated here into a single [`Config`].

mod auth;
mod cache;
mod n8n;
mod server;
mod webhook;

pub use auth::{AuthConfig, MIN_PRODUCTION_TOKEN_LEN, PLACEHOLDER_TOKENS};
pub use cache::CacheConfig;
pub use n8n::N8nConfig;
pub use server::{CorsConfig, RateLimitConfig, ServerConfig};
pub use webhook::WebhookSecurityMode;

use serde::{Deserialize, Serialize};
use std::env;

/// MCP wire transport (§6 `N8N_MCP_TRANSPORT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Stdio,
    Http,
}

impl TransportKind {
    pub fn from_env_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "stdio" => Some(Self::Stdio),
            "http" => Some(Self::Http),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub message: String,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Warning => "warning",
            ConfigSeverity::Error => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

impl ConfigIssue {
    fn warn(message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            message: message.into(),
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportKind,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub n8n: N8nConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub webhook_security: WebhookSecurityMode,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Path to the embedded node-catalog database file, if overridden.
    #[serde(default)]
    pub node_db_path: Option<String>,
    /// Non-production deployments relax the `AUTH_TOKEN` strength checks.
    #[serde(default = "d_production")]
    pub production: bool,
    /// Bearer token required on protected HTTP routes. Read from the env
    /// var named by `auth.api_token_env` (default `AUTH_TOKEN`), never from
    /// the TOML file, so it never ends up committed to a config file.
    #[serde(skip)]
    pub auth_token: Option<String>,
}

fn d_production() -> bool {
    false
}

impl Config {
    /// Parses a TOML document, falling back to [`Config::default`] on an
    /// empty string (no config file present is not an error).
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        toml::from_str(s)
    }

    /// Applies the environment-variable overrides documented in §6. Env
    /// vars win over whatever the TOML file set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("N8N_MCP_TRANSPORT") {
            if let Some(t) = TransportKind::from_env_str(&v) {
                self.transport = t;
            }
        }
        if let Ok(v) = env::var("N8N_API_URL") {
            self.n8n.api_url = Some(v);
        }
        if let Ok(v) = env::var("N8N_API_KEY") {
            self.n8n.api_key = Some(v);
        }
        if let Ok(v) = env::var("PORT") {
            if let Ok(p) = v.parse() {
                self.server.port = p;
            }
        }
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("WEBHOOK_SECURITY_MODE") {
            if let Some(m) = WebhookSecurityMode::from_env_str(&v) {
                self.webhook_security = m;
            }
        }
        if let Ok(v) = env::var("NODE_DB_PATH") {
            self.node_db_path = Some(v);
        }
        if let Ok(v) = env::var(&self.auth.api_token_env) {
            self.auth_token = Some(v);
        }
        if let Ok(v) = env::var("AUTH_RATE_LIMIT_WINDOW") {
            if let Ok(n) = v.parse() {
                self.auth.rate_limit_window_secs = n;
            }
        }
        if let Ok(v) = env::var("AUTH_RATE_LIMIT_MAX") {
            if let Ok(n) = v.parse() {
                self.auth.rate_limit_max = n;
            }
        }
        if let Ok(v) = env::var("ENVIRONMENT").or_else(|_| env::var("NODE_ENV")) {
            self.production = v.eq_ignore_ascii_case("production");
        }
    }

    /// Cross-field and environment validation, returning every issue found
    /// rather than failing on the first one. Callers decide whether to
    /// abort on [`ConfigSeverity::Error`] (the `doctor` CLI subcommand just
    /// reports both severities).
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.transport == TransportKind::Http && self.n8n.api_url.is_none() {
            issues.push(ConfigIssue::warn(
                "HTTP transport selected but N8N_API_URL is unset; REST-backed tools will return NotConfigured",
            ));
        }

        match &self.auth_token {
            None => {
                if self.transport == TransportKind::Http {
                    issues.push(ConfigIssue::warn(
                        "no AUTH_TOKEN set for HTTP transport; protected routes are unauthenticated",
                    ));
                }
            }
            Some(tok) => {
                let lowered = tok.to_ascii_lowercase();
                if PLACEHOLDER_TOKENS.contains(&lowered.as_str()) {
                    issues.push(ConfigIssue::err(
                        "AUTH_TOKEN is a placeholder value; set a real secret",
                    ));
                } else if self.production && tok.len() < MIN_PRODUCTION_TOKEN_LEN {
                    issues.push(ConfigIssue::err(format!(
                        "AUTH_TOKEN must be at least {MIN_PRODUCTION_TOKEN_LEN} chars in production"
                    )));
                }
            }
        }

        if let Some(url) = &self.n8n.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                issues.push(ConfigIssue::err(format!(
                    "N8N_API_URL must start with http:// or https://, got {url:?}"
                )));
            }
        }

        if self.cache.max_entries == 0 {
            issues.push(ConfigIssue::err("cache.max_entries must be > 0"));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.transport, TransportKind::Stdio);
    }

    #[test]
    fn placeholder_token_is_rejected_even_outside_production() {
        let mut cfg = Config::default();
        cfg.auth_token = Some("changeme".into());
        let issues = cfg.validate();
        assert!(issues
            .iter()
            .any(|i| i.severity == ConfigSeverity::Error && i.message.contains("placeholder")));
    }

    #[test]
    fn short_token_only_flagged_in_production() {
        let mut cfg = Config::default();
        cfg.auth_token = Some("short".into());
        assert!(cfg.validate().iter().all(|i| i.severity != ConfigSeverity::Error));

        cfg.production = true;
        let issues = cfg.validate();
        assert!(issues.iter().any(|i| i.severity == ConfigSeverity::Error));
    }

    #[test]
    fn rejects_non_http_api_url() {
        let mut cfg = Config::default();
        cfg.n8n.api_url = Some("ftp://example.com".into());
        let issues = cfg.validate();
        assert!(issues.iter().any(|i| i.message.contains("N8N_API_URL")));
    }

    #[test]
    fn transport_kind_parses_case_insensitively() {
        assert_eq!(TransportKind::from_env_str("HTTP"), Some(TransportKind::Http));
        assert_eq!(TransportKind::from_env_str("bogus"), None);
    }
}
