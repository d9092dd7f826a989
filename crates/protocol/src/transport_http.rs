//! HTTP transport: streamable MCP over a single `POST /mcp` endpoint,
//! with per-request instance context synthesized from headers (§6).
//!
//! Auth middleware grounded on the teacher's
//! `gateway::api::auth::require_api_token`: hash the configured token
//! once at startup, compare in constant time, allow unauthenticated
//! access only when no token is configured.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use n8n_mcp_domain::auth::tokens_match;
use n8n_mcp_domain::config::RateLimitConfig;
use n8n_mcp_domain::instance::InstanceContext;
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::mcp::handle_request;
use crate::rpc::{JsonRpcRequest, PARSE_ERROR};
use crate::state::AppState;

#[derive(Clone)]
pub struct HttpState {
    pub app: Arc<AppState>,
    pub auth_token_hash: Option<[u8; 32]>,
}

pub fn build_router(state: HttpState, rate_limit: Option<&RateLimitConfig>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let router = Router::new()
        .route("/mcp", post(mcp_handler))
        .route("/healthz", get(healthz))
        .layer(middleware::from_fn_with_state(state.clone(), require_bearer_token))
        .layer(cors);

    let router = match rate_limit {
        Some(rl) => {
            let gov_config = GovernorConfigBuilder::default()
                .per_second(rl.requests_per_second as u64)
                .burst_size(rl.burst_size)
                .finish()
                .expect("rate_limit: requests_per_second and burst_size must be > 0");
            router.layer(GovernorLayer { config: Arc::new(gov_config) })
        }
        None => router,
    };

    router.with_state(state)
}

async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

fn instance_context_from_headers(headers: &HeaderMap) -> InstanceContext {
    let get = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    InstanceContext {
        api_url: get("x-n8n-url"),
        api_key: get("x-n8n-key"),
        instance_id: get("x-instance-id"),
        session_id: get("x-session-id"),
        metadata: None,
    }
}

async fn mcp_handler(State(state): State<HttpState>, headers: HeaderMap, body: String) -> Response {
    let ctx = instance_context_from_headers(&headers);
    if let Err(reason) = ctx.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": reason })),
        )
            .into_response();
    }

    let req: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(r) => r,
        Err(e) => {
            return Json(crate::rpc::JsonRpcResponse::failure(
                serde_json::Value::Null,
                PARSE_ERROR,
                format!("parse error: {e}"),
            ))
            .into_response();
        }
    };

    match handle_request(&state.app, &ctx, req).await {
        Some(resp) => Json(resp).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Enforces `Authorization: Bearer <token>` on every route except
/// `/healthz` when a token is configured; dev mode (no token) passes
/// every request through.
async fn require_bearer_token(State(state): State<HttpState>, req: Request<Body>, next: Next) -> Response {
    if req.uri().path() == "/healthz" {
        return next.run(req).await;
    }
    let Some(expected_hash) = state.auth_token_hash else {
        return next.run(req).await;
    };
    let provided = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    if !tokens_match(provided, &expected_hash) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "invalid or missing API token" })),
        )
            .into_response();
    }
    next.run(req).await
}
