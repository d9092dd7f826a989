//! Webhook-trigger invocation (§4.7, §7).
//!
//! Uses a separate client instance from the main REST façade: no
//! `X-N8N-API-KEY` header (the target is a caller-supplied URL, not the
//! configured host, so leaking the API key there would be a credential
//! leak), a 120 s default timeout instead of 30 s, and a mandatory
//! resolve-then-connect SSRF check pinned into the connection so a
//! second DNS lookup inside the HTTP stack can't rebind past the check.

use n8n_mcp_domain::config::WebhookSecurityMode;
use n8n_mcp_domain::Error;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::ssrf::resolve_and_check;

#[derive(Debug, Clone)]
pub struct WebhookInvocation {
    pub url: String,
    pub http_method: String,
    pub data: Option<Value>,
    pub headers: HashMap<String, String>,
    pub wait_for_response: bool,
}

pub async fn trigger_webhook(
    invocation: &WebhookInvocation,
    security_mode: WebhookSecurityMode,
    wait_timeout: Duration,
) -> Result<Value, Error> {
    let parsed = Url::parse(&invocation.url)
        .map_err(|e| Error::InputInvalid(format!("invalid webhook URL: {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| Error::InputInvalid("webhook URL has no host".to_string()))?
        .to_string();
    let port = parsed
        .port_or_known_default()
        .ok_or_else(|| Error::InputInvalid("webhook URL has no resolvable port".to_string()))?;

    let pinned = resolve_and_check(security_mode, &host, port).await?;

    let timeout = if invocation.wait_for_response {
        wait_timeout
    } else {
        Duration::from_secs(10)
    };

    let http = Client::builder()
        .timeout(timeout)
        .resolve(&host, pinned)
        .build()
        .map_err(|e| Error::Transport(e.to_string()))?;

    let method = reqwest::Method::from_bytes(invocation.http_method.to_uppercase().as_bytes())
        .map_err(|_| Error::InputInvalid(format!("unsupported HTTP method: {}", invocation.http_method)))?;

    let mut rb = http.request(method, parsed);
    for (k, v) in &invocation.headers {
        rb = rb.header(k.as_str(), v.as_str());
    }
    if let Some(body) = &invocation.data {
        rb = rb.json(body);
    }

    let resp = rb.send().await.map_err(|e| Error::Transport(e.to_string()))?;
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        return Err(Error::Api { status: status.as_u16(), message: body });
    }

    serde_json::from_str(&body).or_else(|_| Ok(Value::String(body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_loopback_target_in_strict_mode() {
        let invocation = WebhookInvocation {
            url: "http://127.0.0.1:9/hook".into(),
            http_method: "POST".into(),
            data: None,
            headers: HashMap::new(),
            wait_for_response: false,
        };
        let err = trigger_webhook(&invocation, WebhookSecurityMode::Strict, Duration::from_secs(120))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InputInvalid(_)));
    }

    #[tokio::test]
    async fn rejects_malformed_url() {
        let invocation = WebhookInvocation {
            url: "not-a-url".into(),
            http_method: "POST".into(),
            data: None,
            headers: HashMap::new(),
            wait_for_response: false,
        };
        let err = trigger_webhook(&invocation, WebhookSecurityMode::Permissive, Duration::from_secs(120))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InputInvalid(_)));
    }
}
