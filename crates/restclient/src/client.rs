//! Typed façade over the host's REST API (C7, §4.7).
//!
//! Grounded on the teacher's `serialmemory-client::rest::RestSerialMemoryClient`:
//! a single `reqwest::Client`, a `execute_with_retry` wrapper doing
//! exponential backoff on transient failures while leaving 4xx alone, and
//! one conversion function from `reqwest::Error` to the domain error type.
//! Adapted here with the spec's two quirks the teacher's client doesn't
//! need: PUT→PATCH method fallback on update, and a `tags` filter that
//! must be sent as one comma-separated string rather than a repeated
//! query parameter.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use n8n_mcp_domain::config::N8nConfig;
use n8n_mcp_domain::workflow::Workflow;
use n8n_mcp_domain::Error;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::clean::{clean_for_create, clean_for_update};

#[derive(Debug, Clone, Default)]
pub struct ListWorkflowsQuery {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    pub active: Option<bool>,
    pub tags: Vec<String>,
    pub project_id: Option<String>,
    pub exclude_pinned_data: Option<bool>,
}

/// Thin façade over `${baseUrl}/api/v1`. Cloning is cheap (the inner
/// `reqwest::Client` is itself a cheap `Arc` handle) — this is the type
/// cached per-instance by `n8n-mcp-clientcache`.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    max_retries: u32,
}

impl RestClient {
    pub fn new(cfg: &N8nConfig) -> Result<Self, Error> {
        Self::with_url(cfg, cfg.api_url.clone())
    }

    /// Builds a client against `api_url` overriding `cfg.api_url` — used
    /// for per-request instance contexts (§4.6) where the caller supplies
    /// the base URL via transport headers rather than process config.
    pub fn with_url(cfg: &N8nConfig, api_url: Option<String>) -> Result<Self, Error> {
        let base = api_url.ok_or_else(|| Error::NotConfigured("no n8n API URL configured".into()))?;
        let timeout = Duration::from_millis(cfg.api_timeout_ms);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: format!("{}/api/v1", base.trim_end_matches('/')),
            api_key: cfg.api_key.clone(),
            max_retries: cfg.max_retries,
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => rb.header("X-N8N-API-KEY", key),
            None => rb,
        }
    }

    /// Executes a request, retrying idempotent methods and transport
    /// errors with exponential backoff + jitter, up to `max_retries`. 4xx
    /// responses are never retried (§7).
    async fn execute(
        &self,
        label: &str,
        idempotent: bool,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<Response, Error> {
        let attempts = if idempotent { self.max_retries } else { 0 };
        let mut backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(100))
            .with_max_interval(Duration::from_secs(5))
            .with_multiplier(2.0)
            .with_max_elapsed_time(None)
            .build();
        let mut last_err: Option<Error> = None;

        for attempt in 0..=attempts {
            if attempt > 0 {
                let wait = backoff.next_backoff().unwrap_or(Duration::from_millis(100));
                tokio::time::sleep(wait).await;
            }

            match self.decorate(build()).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) if resp.status().is_server_error() => {
                    let status = resp.status().as_u16();
                    let body = resp.text().await.unwrap_or_default();
                    last_err = Some(Error::Api { status, message: body });
                    if !idempotent {
                        return Err(last_err.unwrap());
                    }
                    continue;
                }
                // 4xx (and any other non-success, non-5xx status) is a
                // terminal classification, never retried — this is what
                // lets callers like `update_workflow` pattern-match on
                // `Error::Api { status: 405, .. }` to trigger a fallback.
                Ok(resp) => return Err(Self::classify_error_response(resp).await),
                Err(e) => {
                    tracing::warn!(endpoint = label, error = %e, "transport error calling host API");
                    last_err = Some(Error::Transport(e.to_string()));
                    if !idempotent {
                        return Err(last_err.unwrap());
                    }
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Transport(format!("{label}: retries exhausted"))))
    }

    async fn classify_error_response(resp: Response) -> Error {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Error::Auth(body);
        }
        if status == StatusCode::NOT_FOUND {
            let body = resp.text().await.unwrap_or_default();
            return Error::NotFound(body);
        }
        let body = resp.text().await.unwrap_or_default();
        Error::Api { status: status.as_u16(), message: body }
    }

    /// `execute` only ever returns a success response here; non-2xx
    /// statuses are turned into `Err` before this is reached.
    async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T, Error> {
        let body = resp.text().await.map_err(|e| Error::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(Error::Json)
    }

    pub async fn create_workflow(&self, workflow: &Workflow) -> Result<Workflow, Error> {
        let url = self.url("/workflows");
        let body = clean_for_create(workflow);
        let resp = self
            .execute("POST /workflows", false, || self.http.post(&url).json(&body))
            .await?;
        Self::parse(resp).await
    }

    /// Try PUT; on HTTP 405 (method not allowed), retry once with PATCH —
    /// some host versions accept only one of the two.
    pub async fn update_workflow(&self, id: &str, workflow: &Workflow) -> Result<Workflow, Error> {
        let url = self.url(&format!("/workflows/{id}"));
        let body = clean_for_update(workflow);

        let resp = self
            .execute(&format!("PUT /workflows/{id}"), true, || self.http.put(&url).json(&body))
            .await;

        let resp = match resp {
            Err(Error::Api { status: 405, .. }) => {
                self.execute(&format!("PATCH /workflows/{id}"), true, || {
                    self.http.patch(&url).json(&body)
                })
                .await?
            }
            other => other?,
        };
        Self::parse(resp).await
    }

    pub async fn get_workflow(&self, id: &str) -> Result<Workflow, Error> {
        let url = self.url(&format!("/workflows/{id}"));
        let resp = self
            .execute(&format!("GET /workflows/{id}"), true, || self.http.get(&url))
            .await?;
        Self::parse(resp).await
    }

    pub async fn delete_workflow(&self, id: &str) -> Result<(), Error> {
        let url = self.url(&format!("/workflows/{id}"));
        let resp = self
            .execute(&format!("DELETE /workflows/{id}"), true, || self.http.delete(&url))
            .await?;
        let _: Value = Self::parse(resp).await.unwrap_or(Value::Null);
        Ok(())
    }

    /// `tags`, if non-empty, must be sent as a single comma-separated
    /// query value — a repeated-parameter encoding silently produces no
    /// filter on the host side.
    pub async fn list_workflows(&self, query: &ListWorkflowsQuery) -> Result<Value, Error> {
        let url = self.url("/workflows");
        let resp = self
            .execute("GET /workflows", true, || {
                let mut rb = self.http.get(&url);
                if let Some(limit) = query.limit {
                    rb = rb.query(&[("limit", limit)]);
                }
                if let Some(cursor) = &query.cursor {
                    rb = rb.query(&[("cursor", cursor)]);
                }
                if let Some(active) = query.active {
                    rb = rb.query(&[("active", active)]);
                }
                if !query.tags.is_empty() {
                    rb = rb.query(&[("tags", query.tags.join(","))]);
                }
                if let Some(project_id) = &query.project_id {
                    rb = rb.query(&[("projectId", project_id)]);
                }
                if let Some(exclude) = query.exclude_pinned_data {
                    rb = rb.query(&[("excludePinnedData", exclude)]);
                }
                rb
            })
            .await?;
        Self::parse(resp).await
    }

    pub async fn list_executions(&self) -> Result<Value, Error> {
        let url = self.url("/executions");
        let resp = self
            .execute("GET /executions", true, || self.http.get(&url))
            .await?;
        Self::parse(resp).await
    }

    pub async fn get_execution(&self, id: &str) -> Result<Value, Error> {
        let url = self.url(&format!("/executions/{id}"));
        let resp = self
            .execute(&format!("GET /executions/{id}"), true, || self.http.get(&url))
            .await?;
        Self::parse(resp).await
    }

    pub async fn delete_execution(&self, id: &str) -> Result<(), Error> {
        let url = self.url(&format!("/executions/{id}"));
        let resp = self
            .execute(&format!("DELETE /executions/{id}"), true, || self.http.delete(&url))
            .await?;
        let _: Value = Self::parse(resp).await.unwrap_or(Value::Null);
        Ok(())
    }

    /// `GET /health` may not exist on all host versions; fall back to a
    /// cheap, side-effect-free workflow list.
    pub async fn health_check(&self) -> Result<Value, Error> {
        let health_url = self.url("/health");
        match self
            .execute("GET /health", true, || self.http.get(&health_url))
            .await
        {
            Ok(resp) => Self::parse(resp).await,
            Err(_) => {
                let fallback = self
                    .list_workflows(&ListWorkflowsQuery {
                        limit: Some(1),
                        ..Default::default()
                    })
                    .await?;
                Ok(fallback)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use n8n_mcp_domain::workflow::Connections;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn with_url_requires_a_base_url() {
        let cfg = N8nConfig::default();
        let err = RestClient::with_url(&cfg, None).unwrap_err();
        assert!(matches!(err, Error::NotConfigured(_)));
    }

    #[test]
    fn base_url_gets_api_v1_suffix_and_no_double_slash() {
        let cfg = N8nConfig::default();
        let client = RestClient::with_url(&cfg, Some("https://host.example/".into())).unwrap();
        assert_eq!(client.url("/workflows"), "https://host.example/api/v1/workflows");
    }

    fn sample_workflow() -> Workflow {
        Workflow {
            id: Some("wf1".into()),
            name: "T".into(),
            nodes: vec![],
            connections: Connections::new(),
            settings: None,
            active: None,
            tags: vec![],
            created_at: None,
            updated_at: None,
            version_id: None,
        }
    }

    #[tokio::test]
    async fn update_workflow_falls_back_to_patch_on_405() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/v1/workflows/wf1"))
            .respond_with(ResponseTemplate::new(405))
            .expect(1)
            .mount(&server)
            .await;

        let response_body = serde_json::to_string(&sample_workflow()).unwrap();
        Mock::given(method("PATCH"))
            .and(path("/api/v1/workflows/wf1"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(response_body, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let cfg = N8nConfig::default();
        let client = RestClient::with_url(&cfg, Some(server.uri())).unwrap();
        let result = client.update_workflow("wf1", &sample_workflow()).await;

        assert!(result.is_ok(), "expected PATCH fallback to succeed, got {result:?}");
        server.verify().await;
    }

    #[tokio::test]
    async fn update_workflow_succeeds_on_put_without_patch_fallback() {
        let server = MockServer::start().await;

        let response_body = serde_json::to_string(&sample_workflow()).unwrap();
        Mock::given(method("PUT"))
            .and(path("/api/v1/workflows/wf1"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(response_body, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let cfg = N8nConfig::default();
        let client = RestClient::with_url(&cfg, Some(server.uri())).unwrap();
        let result = client.update_workflow("wf1", &sample_workflow()).await;

        assert!(result.is_ok());
        server.verify().await;
    }
}
